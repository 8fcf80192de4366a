// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! The live acquisition loop.
//!
//! A run resolves the experiment modes, builds the program, executes it and
//! then polls the job until it reports completion:
//!
//! `Connecting -> Running -> (Polling <-> IdleWait) -> Drained -> Closed`
//!
//! Polls without new repetitions are skipped. Every other batch is saved,
//! folded into the running statistics, reshaped and plotted.

use anyhow::Context;
use indexmap::IndexMap;
use program_generator::program_statements::ProgramValue;
use program_generator::stream_processing::tags;
use program_generator::{Program, SequenceBuilder};
use running_stats::RunningStats;
use serde_json::json;
use std::thread;
use std::time::Instant;
use sweeplab_dsl::SweepPlan;
use sweeplab_log::{diagnostic, info, warn};
use uuid::Uuid;

use crate::collaborators::{
    ChannelResolver, DataSaver, HardwareBackend, HardwareChannel, HardwareJob, PlotFrame, Plotter,
};
use crate::experiment::Experiment;
use crate::results::{ResultBatch, ResultFrame, ResultShaper, SavedResult};
use crate::settings::AcquisitionSettings;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionState {
    Connecting,
    Running,
    Polling,
    IdleWait,
    Drained,
    Closed,
}

impl AcquisitionState {
    pub fn can_transition_to(self, next: AcquisitionState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Running)
                | (Self::Running, Self::Polling)
                | (Self::Running, Self::Drained)
                | (Self::Polling, Self::Polling)
                | (Self::Polling, Self::IdleWait)
                | (Self::Polling, Self::Drained)
                | (Self::IdleWait, Self::Polling)
                | (Self::IdleWait, Self::Drained)
                | (Self::Drained, Self::Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Repetitions processed.
    pub count: u64,
    pub polls: usize,
    /// Polls that carried new repetitions.
    pub batches: usize,
    pub stats: Option<RunningStats>,
    pub final_results: IndexMap<String, SavedResult>,
    pub report: String,
}

/// Releases the job on every exit path.
struct JobGuard<J: HardwareJob> {
    job: J,
    released: bool,
}

impl<J: HardwareJob> JobGuard<J> {
    fn new(job: J) -> Self {
        Self {
            job,
            released: false,
        }
    }

    fn close(mut self) -> String {
        let report = self.job.execution_report();
        self.job.release();
        self.released = true;
        report
    }
}

impl<J: HardwareJob> Drop for JobGuard<J> {
    fn drop(&mut self) {
        if !self.released {
            warn!("Releasing the hardware job of an aborted run");
            self.job.release();
        }
    }
}

/// Data saver session, ended when dropped.
struct SaverSession<'s, S: DataSaver + ?Sized> {
    saver: &'s mut S,
}

impl<'s, S: DataSaver + ?Sized> SaverSession<'s, S> {
    fn open(saver: &'s mut S) -> Result<Self> {
        saver
            .begin()
            .context("Failed to open the data saver")
            .map_err(Error::Collaborator)?;
        Ok(Self { saver })
    }
}

impl<S: DataSaver + ?Sized> Drop for SaverSession<'_, S> {
    fn drop(&mut self) {
        self.saver.end();
    }
}

#[derive(Debug, Default)]
struct PollOutcome {
    count: u64,
    polls: usize,
    batches: usize,
    stats: Option<RunningStats>,
    last_frame: Option<ResultFrame>,
}

pub struct AcquisitionLoop<'a> {
    resolver: &'a dyn ChannelResolver,
    settings: AcquisitionSettings,
    state: AcquisitionState,
}

impl<'a> AcquisitionLoop<'a> {
    pub fn new(resolver: &'a dyn ChannelResolver, mut settings: AcquisitionSettings) -> Self {
        for change in settings.sanitize() {
            warn!(
                "Setting '{}' changed from {} to {}: {}",
                change.field,
                change.original,
                change.sanitized,
                change.reason
            );
        }
        Self {
            resolver,
            settings,
            state: AcquisitionState::Connecting,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    fn transition(&mut self, next: AcquisitionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::Transition {
                from: self.state,
                to: next,
            });
        }
        diagnostic!("Acquisition state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Hardware channel of every mode of `experiment`.
    pub fn resolve_channels(&self, experiment: &Experiment) -> Result<IndexMap<String, HardwareChannel>> {
        experiment
            .modes()
            .iter()
            .map(|name| {
                self.resolver
                    .resolve(name)
                    .map(|channel| (name.clone(), channel))
                    .ok_or_else(|| Error::Resolution {
                        name: name.clone(),
                        available: self.resolver.available().join(", "),
                    })
            })
            .collect()
    }

    /// Execute `experiment` on `backend` and acquire its results.
    ///
    /// Nothing reaches the backend unless every mode resolves and the
    /// program builds.
    pub fn run<B, P, S>(
        &mut self,
        experiment: &mut Experiment,
        backend: &mut B,
        plotter: &mut P,
        saver: &mut S,
    ) -> Result<RunSummary>
    where
        B: HardwareBackend,
        P: Plotter + ?Sized,
        S: DataSaver + ?Sized,
    {
        self.state = AcquisitionState::Connecting;
        let channels = self.resolve_channels(experiment)?;
        let plan = experiment.configure()?;
        let program = build_program(experiment, &plan, &channels)?;

        let job = backend.execute(&program).map_err(Error::Connection)?;
        let mut job = JobGuard::new(job);
        self.transition(AcquisitionState::Running)?;
        let run_id = Uuid::new_v4();
        info!("Started run {} of {}", run_id, experiment.name());

        let outcome = {
            let mut session = SaverSession::open(saver)?;
            let mut metadata = experiment.metadata();
            metadata.insert("run_id".to_string(), json!(run_id.to_string()));
            metadata.insert("channels".to_string(), json!(channels));
            session
                .saver
                .add_metadata(&metadata)
                .context("Failed to save the run metadata")
                .map_err(Error::Collaborator)?;
            let outcome = self.poll(experiment, &plan, &mut job.job, plotter, &mut *session.saver)?;
            self.transition(AcquisitionState::Drained)?;
            self.save_final(outcome.last_frame.as_ref(), &mut *session.saver)?;
            outcome
        };

        self.transition(AcquisitionState::Closed)?;
        let report = job.close();
        info!("{}", report);
        Ok(RunSummary {
            run_id,
            count: outcome.count,
            polls: outcome.polls,
            batches: outcome.batches,
            stats: outcome.stats,
            final_results: outcome
                .last_frame
                .as_ref()
                .map(ResultFrame::to_saved)
                .unwrap_or_default(),
            report,
        })
    }

    fn poll<J, P, S>(
        &mut self,
        experiment: &Experiment,
        plan: &SweepPlan,
        job: &mut J,
        plotter: &mut P,
        saver: &mut S,
    ) -> Result<PollOutcome>
    where
        J: HardwareJob,
        P: Plotter + ?Sized,
        S: DataSaver + ?Sized,
    {
        let shaper = ResultShaper::new(experiment, plan);
        let setup = experiment.plot_setup();
        let total = plan.repetitions();
        let mut outcome = PollOutcome::default();
        let mut last_progress = Instant::now();
        while job.is_fetching() {
            self.transition(AcquisitionState::Polling)?;
            let batch = job
                .fetch()
                .context("Failed to fetch partial results")
                .map_err(Error::Backend)?;
            outcome.polls += 1;
            if !is_new_batch(&batch, outcome.count) {
                self.transition(AcquisitionState::IdleWait)?;
                if let Some(timeout) = self
                    .settings
                    .idle_timeout()
                    .filter(|timeout| last_progress.elapsed() >= *timeout)
                {
                    return Err(Error::IdleTimeout(timeout));
                }
                thread::sleep(self.settings.idle_poll_delay());
                continue;
            }
            if batch.count > total {
                warn!("Extra results: {} of {} repetitions", batch.count, total);
            }

            saver
                .update_multiple_results(
                    &batch.values,
                    &self.settings.live_save_tags,
                    &self.settings.results_group,
                )
                .context("Failed to save partial results")
                .map_err(Error::Collaborator)?;

            let stats = running_stats::update(
                batch.get(tags::Z_SQ_RAW)?,
                batch.get(tags::Z_SQ_RAW_AVG)?,
                batch.count,
                outcome.stats.as_ref(),
            )?;
            let frame = shaper.reshape(&batch, Some(&stats))?;
            if !setup.skip_plot {
                let plot_frame = PlotFrame {
                    results: &frame,
                    count: batch.count,
                    fit_fn: experiment.fit_fn(),
                    setup: &setup,
                };
                plotter
                    .live_plot(&plot_frame)
                    .context("Failed to plot partial results")
                    .map_err(Error::Collaborator)?;
            }
            diagnostic!("Processed {} of {} repetitions", batch.count, total);

            outcome.count = batch.count;
            outcome.batches += 1;
            outcome.stats = Some(stats);
            outcome.last_frame = Some(frame);
            last_progress = Instant::now();
            thread::sleep(self.settings.fetch_period());
        }
        Ok(outcome)
    }

    fn save_final<S: DataSaver + ?Sized>(&self, frame: Option<&ResultFrame>, saver: &mut S) -> Result<()> {
        let Some(frame) = frame else {
            warn!("No results were fetched, skipping the final save");
            return Ok(());
        };
        let results = frame.to_saved();
        let keys: Vec<String> = results.keys().cloned().collect();
        saver
            .add_multiple_results(&results, &keys, &self.settings.results_group)
            .context("Failed to save the final results")
            .map_err(Error::Collaborator)
    }
}

/// Whether `batch` carries repetitions beyond `last_count`.
fn is_new_batch(batch: &ResultBatch, last_count: u64) -> bool {
    if batch.is_empty() || batch.count == 0 {
        diagnostic!("No new results");
        return false;
    }
    if batch.count < last_count {
        warn!(
            "Result count went back from {} to {}, skipping the batch",
            last_count,
            batch.count
        );
        return false;
    }
    if batch.count == last_count {
        diagnostic!("No new results after {} repetitions", last_count);
        return false;
    }
    true
}

fn build_program(
    experiment: &Experiment,
    plan: &SweepPlan,
    channels: &IndexMap<String, HardwareChannel>,
) -> Result<Program> {
    let mut builder = SequenceBuilder::new(experiment.variables(), plan);
    for (mode, channel) in channels {
        builder = builder.channel(mode.as_str(), channel.element.as_str());
    }
    let wait_time = i64::try_from(experiment.wait_time_ns()).map_err(|_| {
        Error::Program(format!("Wait time {} ns is too long", experiment.wait_time_ns()))
    })?;
    let modes: Vec<&str> = experiment.modes().iter().map(String::as_str).collect();
    let program = builder.build(|ctx| {
        experiment.sequence().play(ctx)?;
        if wait_time > 0 {
            ctx.wait(ProgramValue::Integer(wait_time), &modes)?;
        }
        Ok(())
    })?;
    Ok(program)
}
