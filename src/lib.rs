//! Invoice fiscalization driver.
//!
//! Chains the external EFI stage tools (extract, bridge, iic, dsig, reg,
//! keep, qrc, pdf) over files in a working directory. The crate does no
//! signing, parsing of invoice content, or tax authority traffic itself.
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod platform;
pub mod prompt;
pub mod secret;
pub mod session;
pub mod stage;

pub use artifacts::{ArtifactKind, ArtifactNames};
pub use config::{Config, ConfigError};
pub use extract::ExtractError;
pub use pipeline::{EntryPoint, Pipeline, PipelineError, PipelineOutcome, PipelineState};
pub use platform::{ExecutableSet, Platform};
pub use secret::Pin;
pub use stage::{ProcessRunner, Stage, StageError, StageInvocation, StageRunner};
