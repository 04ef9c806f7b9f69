//! External stage tools and how they are invoked.
//!
//! Each stage is a separate executable taking single-dash named flags. The
//! invoker passes the flags, inherits stdout/stderr so the operator sees tool
//! output as it happens, and waits for the process to exit.
use crate::secret::{Pin, REDACTED};
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// One step of the fiscalization chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Extract,
    Bridge,
    Iic,
    Dsig,
    Reg,
    Keep,
    Qrc,
    Pdf,
}

impl Stage {
    pub const COUNT: usize = 8;

    /// All stages in chain order.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Extract,
        Stage::Bridge,
        Stage::Iic,
        Stage::Dsig,
        Stage::Reg,
        Stage::Keep,
        Stage::Qrc,
        Stage::Pdf,
    ];

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// File name of the tool, without any platform suffix.
    pub fn executable_name(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Bridge => "bridge",
            Stage::Iic => "iic",
            Stage::Dsig => "dsig",
            Stage::Reg => "reg",
            Stage::Keep => "keep",
            Stage::Qrc => "qrc",
            Stage::Pdf => "pdf",
        }
    }

    /// Operator-facing progress label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Extract => "Extracting",
            Stage::Bridge => "Bridging",
            Stage::Iic => "IIC",
            Stage::Dsig => "DSIG",
            Stage::Reg => "REG",
            Stage::Keep => "KEEP",
            Stage::Qrc => "QRC",
            Stage::Pdf => "PDF",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage}: failed to start {}", .program.display())]
    Spawn {
        stage: Stage,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage}: exited with status {status}")]
    Failed {
        stage: Stage,
        code: Option<i32>,
        status: String,
    },
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Spawn { stage, .. } | StageError::Failed { stage, .. } => *stage,
        }
    }

    /// Build a failure from the exit status of a finished child.
    pub fn from_status(stage: Stage, status: &ExitStatus) -> Self {
        StageError::Failed {
            stage,
            code: status.code(),
            status: exit_status_string(status),
        }
    }
}

/// Value bound to a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Path(PathBuf),
    Secret(Pin),
}

impl ArgValue {
    fn to_os_string(&self) -> OsString {
        match self {
            ArgValue::Text(text) => OsString::from(text),
            ArgValue::Path(path) => path.as_os_str().to_os_string(),
            ArgValue::Secret(pin) => OsString::from(pin.expose()),
        }
    }

    fn redacted(&self) -> String {
        match self {
            ArgValue::Text(text) => text.clone(),
            ArgValue::Path(path) => path.display().to_string(),
            ArgValue::Secret(_) => REDACTED.to_string(),
        }
    }
}

/// A `-flag value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArg {
    pub flag: &'static str,
    pub value: ArgValue,
}

/// Fully resolved call of one stage tool.
#[derive(Debug, Clone)]
pub struct StageInvocation {
    pub stage: Stage,
    pub program: PathBuf,
    pub work_dir: PathBuf,
    pub args: Vec<StageArg>,
    /// Artifact the tool is expected to write, if any.
    pub output: Option<PathBuf>,
}

impl StageInvocation {
    pub fn new(stage: Stage, program: &Path, work_dir: &Path) -> Self {
        Self {
            stage,
            program: program.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            args: Vec::new(),
            output: None,
        }
    }

    pub fn text(mut self, flag: &'static str, value: &str) -> Self {
        self.args.push(StageArg {
            flag,
            value: ArgValue::Text(value.to_string()),
        });
        self
    }

    pub fn path(mut self, flag: &'static str, value: &Path) -> Self {
        self.args.push(StageArg {
            flag,
            value: ArgValue::Path(value.to_path_buf()),
        });
        self
    }

    pub fn secret(mut self, flag: &'static str, pin: &Pin) -> Self {
        self.args.push(StageArg {
            flag,
            value: ArgValue::Secret(pin.clone()),
        });
        self
    }

    /// Bind the `-out` flag and record it as the stage's artifact.
    pub fn output(mut self, path: &Path) -> Self {
        self.output = Some(path.to_path_buf());
        self.path("-out", path)
    }

    /// Flags in declaration order, e.g. `["-pin", "-in", "-out"]`.
    pub fn flags(&self) -> Vec<&'static str> {
        self.args.iter().map(|arg| arg.flag).collect()
    }

    pub fn value(&self, flag: &str) -> Option<&ArgValue> {
        self.args
            .iter()
            .find(|arg| arg.flag == flag)
            .map(|arg| &arg.value)
    }

    pub fn path_value(&self, flag: &str) -> Option<&Path> {
        match self.value(flag)? {
            ArgValue::Path(path) => Some(path.as_path()),
            _ => None,
        }
    }

    /// Argument vector handed to the child process.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() * 2);
        for arg in &self.args {
            argv.push(OsString::from(arg.flag));
            argv.push(arg.value.to_os_string());
        }
        argv
    }

    /// Shell-like rendering with secrets replaced, safe for logs.
    pub fn redacted_command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() * 2 + 1);
        parts.push(shell_quote(&self.program.display().to_string()));
        for arg in &self.args {
            parts.push(arg.flag.to_string());
            parts.push(shell_quote(&arg.value.redacted()));
        }
        parts.join(" ")
    }
}

/// Executes stage invocations.
pub trait StageRunner {
    fn run(&mut self, invocation: &StageInvocation) -> Result<(), StageError>;
}

impl<R: StageRunner + ?Sized> StageRunner for &mut R {
    fn run(&mut self, invocation: &StageInvocation) -> Result<(), StageError> {
        (**self).run(invocation)
    }
}

/// Runs stage tools as child processes sharing this process's stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    quiet: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the `<Stage>: OK` progress lines.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn progress_start(&self, stage: Stage) {
        if self.quiet {
            return;
        }
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{}: ", stage.label());
        let _ = stdout.flush();
    }

    fn progress_done(&self, ok: bool) {
        if self.quiet {
            return;
        }
        if ok {
            println!("{}", console::style("OK").green());
        } else {
            println!("{}", console::style("FAILED").red());
        }
    }
}

impl StageRunner for ProcessRunner {
    fn run(&mut self, invocation: &StageInvocation) -> Result<(), StageError> {
        let stage = invocation.stage;
        tracing::info!(
            stage = %stage,
            command = %invocation.redacted_command_line(),
            "running stage"
        );
        self.progress_start(stage);

        let status = Command::new(&invocation.program)
            .args(invocation.argv())
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| {
                self.progress_done(false);
                StageError::Spawn {
                    stage,
                    program: invocation.program.clone(),
                    source,
                }
            })?;

        if !status.success() {
            self.progress_done(false);
            tracing::warn!(stage = %stage, status = %exit_status_string(&status), "stage failed");
            return Err(StageError::from_status(stage, &status));
        }
        self.progress_done(true);
        tracing::debug!(stage = %stage, "stage complete");
        Ok(())
    }
}

fn exit_status_string(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        format!("{code}")
    } else {
        "terminated by signal".to_string()
    }
}

fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg.chars().all(|ch| {
        matches!(
            ch,
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' | '/' | ':' | '*' | '+' | '='
        )
    });
    if safe {
        return arg.to_string();
    }
    let escaped = arg.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}
