//! One operator session: gather inputs, run the pipeline, report.
//!
//! Everything fallible here returns `anyhow::Result` so `main` is the single
//! place that prints an error and sets the exit status.
use crate::config::load_config;
use crate::pipeline::{EntryPoint, Pipeline, PipelineOutcome, PipelineReport};
use crate::platform::ExecutableSet;
use crate::prompt::Operator;
use crate::stage::StageRunner;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a file: {}", .path.display())]
    NotAFile { path: PathBuf },
}

/// Answers supplied up front on the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub entry: Option<EntryPoint>,
    pub input: Option<PathBuf>,
}

#[derive(Debug)]
pub enum SessionOutcome {
    /// The operator picked no action.
    Cancelled,
    Completed(PipelineReport),
}

/// Resolve the working directory: an explicit one, or the executable's own
/// directory.
pub fn resolve_work_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => {
            let exe = std::env::current_exe().context("locate current executable")?;
            exe.parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| anyhow!("executable {} has no parent directory", exe.display()))?
        }
    };
    dir.canonicalize()
        .with_context(|| format!("resolve working directory {}", dir.display()))
}

/// Check that `path` names an existing file. Relative paths are taken from
/// the working directory.
pub fn validate_input_file(work_dir: &Path, path: &Path) -> Result<PathBuf, InputError> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    };
    let meta = fs::metadata(&path).map_err(|source| InputError::NotFound {
        path: path.clone(),
        source,
    })?;
    if meta.is_dir() {
        return Err(InputError::NotAFile { path });
    }
    Ok(path)
}

/// Run one session against `work_dir`.
pub fn run_session<O: Operator, R: StageRunner>(
    options: &SessionOptions,
    work_dir: &Path,
    executables: &ExecutableSet,
    operator: &mut O,
    runner: R,
) -> Result<SessionOutcome> {
    let entry = match options.entry {
        Some(entry) => entry,
        None => match operator.choose_entry()? {
            Some(entry) => entry,
            None => return Ok(SessionOutcome::Cancelled),
        },
    };
    println!("WorkDir: {}", work_dir.display());

    let config = load_config(work_dir)?;
    let pin = operator.read_pin()?;
    let raw_input = match &options.input {
        Some(path) => path.clone(),
        None => operator.read_path(entry.input_prompt())?,
    };
    let input = validate_input_file(work_dir, &raw_input)?;
    tracing::info!(%entry, input = %input.display(), "session inputs ready");

    let mut pipeline = Pipeline::new(&config, &pin, executables, runner);
    let report = pipeline
        .run(entry, work_dir, &input)
        .with_context(|| format!("{entry} registration of {}", input.display()))?;
    print!("{}", render_outcome(&report.outcome));
    Ok(SessionOutcome::Completed(report))
}

/// Final operator message for a successful run.
pub fn render_outcome(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Certified { pdf } => format!(
            "Invoice registered. New PDF file: {}\n\nEnjoy your day\n",
            pdf.display()
        ),
        PipelineOutcome::Registered { iic, fic, qr_code } => {
            let mut out = String::from("Invoice registered\n");
            out.push_str(&format!("IKOF (Kôd izdavaoca računa): {iic}\n"));
            out.push_str(&format!(
                "JIKR (Jedinstveni identifikacioni kod računa): {fic}\n"
            ));
            out.push_str(&format!("QR Code saved at: {}\n", qr_code.display()));
            out
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
