// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::variable_spec::VariableSpec;

/// Variables of an experiment, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableSet {
    variables: IndexMap<String, VariableSpec>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, replacing and returning a previous one of the same name.
    ///
    /// A replaced variable keeps its original position.
    pub fn insert<S: Into<String>>(&mut self, name: S, spec: VariableSpec) -> Option<VariableSpec> {
        self.variables.insert(name.into(), spec)
    }

    pub fn with_variable<S: Into<String>>(mut self, name: S, spec: VariableSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Remove a variable, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<VariableSpec> {
        self.variables.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableSpec> {
        self.variables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableSpec)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Variables that own a stream, with their tags.
    pub fn tagged(&self) -> impl Iterator<Item = (&str, &str, &VariableSpec)> {
        self.variables.iter().filter_map(|(name, spec)| {
            spec.stream_tag
                .as_deref()
                .map(|tag| (name.as_str(), tag, spec))
        })
    }
}

impl Extend<(String, VariableSpec)> for VariableSet {
    fn extend<T: IntoIterator<Item = (String, VariableSpec)>>(&mut self, iter: T) {
        self.variables.extend(iter);
    }
}

impl FromIterator<(String, VariableSpec)> for VariableSet {
    fn from_iter<T: IntoIterator<Item = (String, VariableSpec)>>(iter: T) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}
