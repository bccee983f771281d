//! Job orchestration: probe, plan, supervise, parse, finalize

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::domain::model::{
    CompressionStrategy, Job, JobState, MediaKind, MediaMetadata, ProgressSample,
};
use crate::domain::rules::StrategyValidator;
use crate::engine::parser::{ParseEvent, StreamingOutputParser};
use crate::engine::progress::ProgressSink;
use crate::engine::state::AtomicJobState;
use crate::engine::supervisor::{ExitOutcome, ProcessSupervisor};
use crate::engine::EngineConfig;
use crate::error::{ShrinkXError, ShrinkXResult};
use crate::output::remove_partial_output;
use crate::output::verifier::{OutputReport, OutputVerifier};
use crate::planner::{CommandBuilder, CommandPlan};
use crate::ports::{default_suspender, ProbePort, ProcessSuspender};
use crate::probe::inspector::MediaInspector;
use crate::probe::validator::classify_media_kind;
use crate::utils::time::format_timestamp;

const ACTIVE: [JobState; 2] = [JobState::Running, JobState::Paused];

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(OutputReport),
    Cancelled,
}

#[derive(Default)]
struct JobDetails {
    output_path: Option<PathBuf>,
    strategy: Option<CompressionStrategy>,
    metadata: Option<MediaMetadata>,
}

/// Runs compression jobs for one source file, one at a time.
///
/// `pause`, `resume` and `cancel` may be called from other tasks while
/// `run_strategy` is in flight.
pub struct TranscodeEngine {
    config: EngineConfig,
    source: PathBuf,
    kind: MediaKind,
    prober: Arc<dyn ProbePort>,
    supervisor: ProcessSupervisor,
    state: AtomicJobState,
    details: Mutex<JobDetails>,
}

impl TranscodeEngine {
    /// Engine using ffmpeg for probing and the platform's process suspender
    pub fn new(config: EngineConfig, source: impl AsRef<Path>) -> ShrinkXResult<Self> {
        let prober = Arc::new(MediaInspector::new(&config.ffmpeg_path));
        Self::with_components(config, source, prober, default_suspender())
    }

    pub fn with_components(
        config: EngineConfig,
        source: impl AsRef<Path>,
        prober: Arc<dyn ProbePort>,
        suspender: Arc<dyn ProcessSuspender>,
    ) -> ShrinkXResult<Self> {
        let source = source.as_ref().to_path_buf();
        let kind = classify_media_kind(&source)?;
        Ok(Self {
            config,
            source,
            kind,
            prober,
            supervisor: ProcessSupervisor::new(suspender),
            state: AtomicJobState::default(),
            details: Mutex::new(JobDetails::default()),
        })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn state(&self) -> JobState {
        self.state.get()
    }

    /// Output path of the current or most recent run
    pub fn output_path(&self) -> Option<PathBuf> {
        self.details().output_path.clone()
    }

    /// Snapshot of the job
    pub fn job(&self) -> Job {
        let details = self.details();
        Job {
            output_path: details.output_path.clone(),
            strategy: details.strategy.clone(),
            state: self.state.get(),
            ..Job::new(&self.source, self.kind)
        }
    }

    fn details(&self) -> MutexGuard<'_, JobDetails> {
        self.details.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe the source, reusing an earlier result
    pub async fn probe(&self) -> ShrinkXResult<MediaMetadata> {
        let cached = self.details().metadata.clone();
        if let Some(metadata) = cached {
            return Ok(metadata);
        }

        info!("Probing {}", self.source.display());
        let metadata = self.prober.probe(&self.source).await?;
        self.details().metadata = Some(metadata.clone());
        Ok(metadata)
    }

    /// Run one compression job to completion, failure or cancellation
    pub async fn run_strategy(
        &self,
        strategy: CompressionStrategy,
        sink: &dyn ProgressSink,
    ) -> ShrinkXResult<JobOutcome> {
        if self
            .state
            .transition_where(JobState::can_start, JobState::Running)
            .is_none()
        {
            return Err(ShrinkXError::JobAlreadyRunning);
        }
        info!("Starting {} on {}", strategy.kind(), self.source.display());
        {
            let mut details = self.details();
            details.output_path = None;
            details.strategy = Some(strategy.clone());
        }
        sink.on_progress(&ProgressSample::initial());

        let plan = match self.prepare(&strategy).await {
            Ok(plan) => plan,
            Err(e) => return Err(self.abort_before_start(e)),
        };

        if self.state.get() == JobState::Cancelled {
            info!("Cancelled before the encoder started");
            return Ok(JobOutcome::Cancelled);
        }
        sink.on_output(&plan.output_path);

        self.supervise(&plan, sink).await
    }

    async fn prepare(&self, strategy: &CompressionStrategy) -> ShrinkXResult<CommandPlan> {
        StrategyValidator::validate(strategy, self.kind)?;

        let metadata = if strategy.needs_metadata() {
            Some(self.probe().await?)
        } else {
            let cached = self.details().metadata.clone();
            cached
        };

        let plan = CommandBuilder::new(&self.source, self.kind).build(strategy, metadata.as_ref())?;
        self.details().output_path = Some(plan.output_path.clone());
        Ok(plan)
    }

    async fn supervise(
        &self,
        plan: &CommandPlan,
        sink: &dyn ProgressSink,
    ) -> ShrinkXResult<JobOutcome> {
        let mut process = match self.supervisor.start(&self.config.ffmpeg_path, &plan.args) {
            Ok(process) => process,
            Err(e) => return Err(self.abort_before_start(e)),
        };
        debug!(pid = process.pid(), "Encoder started");

        // Control calls that landed before the process existed
        match self.state.get() {
            JobState::Cancelled => self.supervisor.cancel(Some(&plan.output_path)).await?,
            JobState::Paused => {
                self.supervisor.pause()?;
            }
            _ => {}
        }

        let mut parser =
            StreamingOutputParser::new(plan.profile).with_known_duration(plan.known_duration);
        let mut fatal: Option<ShrinkXError> = None;
        let mut last_message: Option<String> = None;

        while let Some(line) = process.next_line().await {
            if self.supervisor.was_killed() {
                continue;
            }
            match parser.feed(&line) {
                ParseEvent::ProgressTick(sample) => {
                    sink.on_progress(&sample.scaled(self.config.progress_max));
                }
                ParseEvent::DurationDiscovered(duration) => {
                    debug!("Source duration: {}", format_timestamp(duration));
                }
                ParseEvent::Fatal { kind, message } => {
                    let error = kind.into_error(message);
                    warn!("Encoder reported a fatal error: {}", error);
                    if let Err(e) = self.supervisor.pause() {
                        debug!("Could not suspend failing encoder: {}", e);
                    }
                    sink.on_error(&error);
                    self.supervisor.cancel(Some(&plan.output_path)).await?;
                    fatal = Some(error);
                }
                ParseEvent::Ignored => last_message = Some(line),
            }
        }

        let outcome = process.wait().await;

        if let Some(error) = fatal {
            self.state.transition(&ACTIVE, JobState::Failed);
            return Err(error);
        }

        match outcome {
            Ok(ExitOutcome::Killed) => {
                self.state.transition(&ACTIVE, JobState::Cancelled);
                info!("Job cancelled");
                Ok(JobOutcome::Cancelled)
            }
            Ok(ExitOutcome::Exited(status)) if status.success() => {
                if self.state.transition(&ACTIVE, JobState::Completed).is_none() {
                    info!("Job was cancelled as the encoder finished");
                    remove_partial_output(&plan.output_path);
                    return Ok(JobOutcome::Cancelled);
                }
                sink.on_progress(&ProgressSample::completed(self.config.progress_max));

                let source_size = std::fs::metadata(&self.source)
                    .map(|m| m.len())
                    .unwrap_or_default();
                match OutputVerifier::verify(&plan.output_path, source_size) {
                    Ok(report) => {
                        info!("Job completed: {}", report.output_path.display());
                        Ok(JobOutcome::Completed(report))
                    }
                    Err(e) => {
                        self.state.transition(&[JobState::Completed], JobState::Failed);
                        Err(e)
                    }
                }
            }
            Ok(ExitOutcome::Exited(status)) => {
                remove_partial_output(&plan.output_path);
                if self.state.transition(&ACTIVE, JobState::Failed).is_none() {
                    return Ok(JobOutcome::Cancelled);
                }
                let code = status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "a signal".to_string());
                warn!("Encoder exited with {}", code);
                Err(ShrinkXError::EncoderFailed {
                    code,
                    message: last_message.unwrap_or_default(),
                })
            }
            Err(e) => {
                remove_partial_output(&plan.output_path);
                self.state.transition(&ACTIVE, JobState::Failed);
                Err(e)
            }
        }
    }

    /// Return to idle after an error that happened before encoding began
    fn abort_before_start(&self, error: ShrinkXError) -> ShrinkXError {
        warn!("Job did not start: {}", error);
        self.state.transition(&ACTIVE, JobState::Idle);
        error
    }

    /// Suspend the running encoder
    pub fn pause(&self) -> ShrinkXResult<()> {
        if self.state.transition(&[JobState::Running], JobState::Paused).is_none() {
            debug!("Pause ignored in state {}", self.state.get());
            return Ok(());
        }
        if let Err(e) = self.supervisor.pause() {
            self.state.transition(&[JobState::Paused], JobState::Running);
            return Err(e);
        }
        Ok(())
    }

    /// Resume a paused encoder
    pub fn resume(&self) -> ShrinkXResult<()> {
        if self.state.transition(&[JobState::Paused], JobState::Running).is_none() {
            debug!("Resume ignored in state {}", self.state.get());
            return Ok(());
        }
        if let Err(e) = self.supervisor.resume() {
            self.state.transition(&[JobState::Running], JobState::Paused);
            return Err(e);
        }
        Ok(())
    }

    /// Kill the encoder and remove its partial output. Does nothing unless a job is active.
    pub async fn cancel(&self) -> ShrinkXResult<()> {
        if self.state.transition(&ACTIVE, JobState::Cancelled).is_none() {
            let state = self.state.get();
            if state.is_terminal() {
                debug!("Cancel ignored, job already {}", state);
            } else {
                debug!("Cancel ignored, no job running");
            }
            return Ok(());
        }
        info!("Cancelling job on {}", self.source.display());
        let output = self.output_path();
        self.supervisor.cancel(output.as_deref()).await
    }
}
