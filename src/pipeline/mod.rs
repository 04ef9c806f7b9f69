//! Invoice pipeline orchestration.
//!
//! A run threads one invoice through the stage tools in a fixed order. Each
//! stage's output artifact is recorded on the run so later stages can read
//! any earlier artifact, not just the previous one (keep, qrc and pdf all
//! read the signed request together with the registration response). The
//! first failing stage ends the run; artifacts already written stay on disk.
mod state;

pub use state::{EntryPoint, PipelineState};

use crate::artifacts::{ArtifactKind, ArtifactNames};
use crate::config::{validate_config, Config, ConfigError};
use crate::extract::{self, ExtractError};
use crate::platform::ExecutableSet;
use crate::secret::Pin;
use crate::stage::{Stage, StageError, StageInvocation, StageRunner};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("{stage} requires the {kind} artifact, which this run has not produced")]
    MissingArtifact { stage: Stage, kind: ArtifactKind },
}

/// Artifact a stage writes, if it writes one.
pub fn stage_output(stage: Stage) -> Option<ArtifactKind> {
    match stage {
        Stage::Extract => Some(ArtifactKind::Extract),
        Stage::Bridge => Some(ArtifactKind::Bridge),
        Stage::Iic => Some(ArtifactKind::Iic),
        Stage::Dsig => Some(ArtifactKind::Dsig),
        Stage::Reg => Some(ArtifactKind::Reg),
        Stage::Keep => None,
        Stage::Qrc => Some(ArtifactKind::Qrc),
        Stage::Pdf => Some(ArtifactKind::Pdf),
    }
}

/// Execution context of a single invoice.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    entry: EntryPoint,
    input: PathBuf,
    names: ArtifactNames,
    state: PipelineState,
    artifacts: Vec<(ArtifactKind, PathBuf)>,
    invoked: Vec<Stage>,
}

impl PipelineRun {
    /// Start a run for `input`, naming artifacts inside `work_dir`.
    pub fn new(entry: EntryPoint, work_dir: &Path, input: &Path) -> Self {
        let mut artifacts = Vec::new();
        if let Some(kind) = entry.seed_artifact() {
            artifacts.push((kind, input.to_path_buf()));
        }
        Self {
            entry,
            input: input.to_path_buf(),
            names: ArtifactNames::for_input(work_dir, input),
            state: entry.initial_state(),
            artifacts,
            invoked: Vec::new(),
        }
    }

    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    /// File the operator handed in.
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn names(&self) -> &ArtifactNames {
        &self.names
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Artifacts in the order they became available, including a seed input.
    pub fn artifacts(&self) -> &[(ArtifactKind, PathBuf)] {
        &self.artifacts
    }

    /// Paths written by stages of this run, seed input excluded.
    pub fn produced_paths(&self) -> Vec<PathBuf> {
        let seeded = usize::from(self.entry.seed_artifact().is_some());
        self.artifacts
            .iter()
            .skip(seeded)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Stages invoked so far, including a failed one.
    pub fn invoked(&self) -> &[Stage] {
        &self.invoked
    }

    fn artifact(&self, stage: Stage, kind: ArtifactKind) -> Result<&Path, PipelineError> {
        self.artifacts
            .iter()
            .rev()
            .find(|(recorded, _)| *recorded == kind)
            .map(|(_, path)| path.as_path())
            .ok_or(PipelineError::MissingArtifact { stage, kind })
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.state, to = ?next, "pipeline transition");
        self.state = next;
    }
}

/// Operator-facing result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Automatic run finished with a registered PDF.
    Certified { pdf: PathBuf },
    /// Manual run finished with identifiers read back from the artifacts.
    Registered {
        iic: String,
        fic: String,
        qr_code: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run: PipelineRun,
    pub outcome: PipelineOutcome,
}

/// Drives stage tools for one invoice at a time.
pub struct Pipeline<'a, R> {
    config: &'a Config,
    pin: &'a Pin,
    executables: &'a ExecutableSet,
    runner: R,
}

impl<'a, R: StageRunner> Pipeline<'a, R> {
    pub fn new(config: &'a Config, pin: &'a Pin, executables: &'a ExecutableSet, runner: R) -> Self {
        Self {
            config,
            pin,
            executables,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every stage of `entry` for `input` and report the outcome.
    pub fn run(
        &mut self,
        entry: EntryPoint,
        work_dir: &Path,
        input: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        let mut run = PipelineRun::new(entry, work_dir, input);
        self.execute(&mut run)?;
        let outcome = self.finish(&mut run)?;
        Ok(PipelineReport { run, outcome })
    }

    /// Advance `run` through its remaining stages, stopping at the first failure.
    ///
    /// On error `run` reflects the last completed state and every artifact
    /// produced before the failing stage.
    pub fn execute(&mut self, run: &mut PipelineRun) -> Result<(), PipelineError> {
        validate_config(self.config)?;
        tracing::info!(
            entry = %run.entry,
            input = %run.input.display(),
            base = run.names.base(),
            "pipeline start"
        );
        while let Some(stage) = self.pending_stage(run) {
            let invocation = self.invocation(stage, run)?;
            run.invoked.push(stage);
            self.runner.run(&invocation)?;
            if let (Some(kind), Some(path)) = (stage_output(stage), invocation.output) {
                run.artifacts.push((kind, path));
            }
            run.advance(PipelineState::after(stage));
        }
        Ok(())
    }

    fn pending_stage(&self, run: &PipelineRun) -> Option<Stage> {
        let stage = run.state.next_stage()?;
        run.entry.stages().contains(&stage).then_some(stage)
    }

    /// Build the argument contract of `stage` from the run's artifacts.
    pub fn invocation(
        &self,
        stage: Stage,
        run: &PipelineRun,
    ) -> Result<StageInvocation, PipelineError> {
        let config = self.config;
        let names = &run.names;
        let invocation =
            StageInvocation::new(stage, self.executables.program(stage), names.work_dir());
        let invocation = match stage {
            Stage::Extract => invocation
                .text("-key", &config.extraction.api_key)
                .text("-template", &config.extraction.template)
                .path("-in", &run.input)
                .output(&names.path(ArtifactKind::Extract)),
            Stage::Bridge => invocation
                .text("-soft", &config.software_code)
                .text("-op", &config.operator_code)
                .text("-busin", &config.business_unit_code)
                .text("-tcr", &config.tcr_code)
                .path("-in", run.artifact(stage, ArtifactKind::Extract)?)
                .output(&names.path(ArtifactKind::Bridge)),
            Stage::Iic => invocation
                .secret("-pin", self.pin)
                .path("-in", run.artifact(stage, ArtifactKind::Bridge)?)
                .output(&names.path(ArtifactKind::Iic)),
            Stage::Dsig => invocation
                .secret("-pin", self.pin)
                .text("-busin", &config.business_unit_code)
                .text("-soft", &config.software_code)
                .path("-in", run.artifact(stage, ArtifactKind::Iic)?)
                .output(&names.path(ArtifactKind::Dsig)),
            Stage::Reg => invocation
                .secret("-pin", self.pin)
                .text("-env", &config.environment)
                .path("-in", run.artifact(stage, ArtifactKind::Dsig)?)
                .output(&names.path(ArtifactKind::Reg)),
            Stage::Keep => invocation
                .path("-req", run.artifact(stage, ArtifactKind::Dsig)?)
                .path("-resp", run.artifact(stage, ArtifactKind::Reg)?),
            Stage::Qrc => invocation
                .path("-req", run.artifact(stage, ArtifactKind::Dsig)?)
                .path("-resp", run.artifact(stage, ArtifactKind::Reg)?)
                .output(&names.path(ArtifactKind::Qrc))
                .text("-env", &config.environment),
            Stage::Pdf => invocation
                .path("-in", &run.input)
                .output(&names.path(ArtifactKind::Pdf))
                .path("-req", run.artifact(stage, ArtifactKind::Dsig)?)
                .path("-resp", run.artifact(stage, ArtifactKind::Reg)?)
                .path("-qr", run.artifact(stage, ArtifactKind::Qrc)?),
        };
        Ok(invocation)
    }

    fn finish(&self, run: &mut PipelineRun) -> Result<PipelineOutcome, PipelineError> {
        let outcome = match run.entry {
            EntryPoint::Automatic => PipelineOutcome::Certified {
                pdf: run.artifact(Stage::Pdf, ArtifactKind::Pdf)?.to_path_buf(),
            },
            EntryPoint::Manual => {
                let iic = extract::read_iic(run.artifact(Stage::Dsig, ArtifactKind::Dsig)?)?;
                let fic = extract::read_fic(run.artifact(Stage::Reg, ArtifactKind::Reg)?)?;
                PipelineOutcome::Registered {
                    iic,
                    fic,
                    qr_code: run.artifact(Stage::Qrc, ArtifactKind::Qrc)?.to_path_buf(),
                }
            }
        };
        run.advance(run.entry.terminal_state());
        tracing::info!(entry = %run.entry, "pipeline complete");
        Ok(outcome)
    }
}
