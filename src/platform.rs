//! Stage executable resolution.
use crate::stage::Stage;
use std::path::{Path, PathBuf};

/// Operating system family, as far as executable naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    fn executable_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Unix => "",
        }
    }
}

/// Paths of the eight stage tools, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSet {
    platform: Platform,
    paths: [PathBuf; Stage::COUNT],
}

impl ExecutableSet {
    /// Resolve every stage tool inside `work_dir` for the given platform.
    pub fn resolve(work_dir: &Path, platform: Platform) -> Self {
        let paths = Stage::ALL.map(|stage| {
            work_dir.join(format!(
                "{}{}",
                stage.executable_name(),
                platform.executable_suffix()
            ))
        });
        Self { platform, paths }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn program(&self, stage: Stage) -> &Path {
        &self.paths[stage.index()]
    }
}
