use anyhow::Result;
use clap::Parser;
use efi::cli::{init_tracing, RootArgs};
use efi::prompt::ConsoleOperator;
use efi::session::{self, resolve_work_dir};
use efi::{ExecutableSet, Platform, ProcessRunner};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(&args);

    let work_dir = resolve_work_dir(args.workdir.as_deref())?;
    let executables = ExecutableSet::resolve(&work_dir, Platform::detect());
    tracing::debug!(platform = ?executables.platform(), "stage executables resolved");

    let mut operator = ConsoleOperator::new();
    session::run_session(
        &args.session_options(),
        &work_dir,
        &executables,
        &mut operator,
        ProcessRunner::new(),
    )?;
    Ok(())
}
