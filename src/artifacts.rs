//! Artifact naming for a single invoice run.
//!
//! Every stage writes its output next to the stage executables, named after
//! the invoice file with a stage-specific suffix. Keeping the derivation in
//! one place means the orchestrator never builds a path by hand.
use std::fmt;
use std::path::{Path, PathBuf};

/// Files a pipeline stage can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    Extract,
    Bridge,
    Iic,
    Dsig,
    Reg,
    Qrc,
    Pdf,
}

impl ArtifactKind {
    /// Suffix appended to the base name, without the leading dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Extract => "extract",
            ArtifactKind::Bridge => "bridge",
            ArtifactKind::Iic => "iic",
            ArtifactKind::Dsig => "dsig",
            ArtifactKind::Reg => "reg",
            ArtifactKind::Qrc => "qrc",
            ArtifactKind::Pdf => "reg.pdf",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Strip the final extension from the file name of `input`.
///
/// A name without an extension is returned unchanged, and a path with no
/// file name component falls back to its full display form.
pub fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .or_else(|| input.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| input.display().to_string())
}

/// Path derivation rooted at the run's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    work_dir: PathBuf,
    base: String,
}

impl ArtifactNames {
    pub fn new(work_dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            base: base.into(),
        }
    }

    /// Derive names from the operator-supplied input file.
    pub fn for_input(work_dir: impl Into<PathBuf>, input: &Path) -> Self {
        Self::new(work_dir, base_name(input))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Return `<work_dir>/<base>.<suffix>` for the given artifact.
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.work_dir.join(format!("{}.{}", self.base, kind.suffix()))
    }
}
