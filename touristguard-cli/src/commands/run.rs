//! Run command - resume tracking for the stored identity.

use touristguard::activation::ResumeOutcome;

use super::common::PositionArgs;
use super::tracking;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
pub struct RunArgs {
    pub position: PositionArgs,
    pub verbose: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("run");
    let runtime = runner.runtime()?;

    runtime.block_on(async {
        let host = runner.tracking_host(&args.position)?;

        let outcome = match host.controller.resume().await {
            Ok(outcome) => outcome,
            Err(e) => {
                host.shutdown().await;
                return Err(e.into());
            }
        };

        match outcome {
            ResumeOutcome::Resumed(session) | ResumeOutcome::AlreadyRunning(session) => {
                tracking::follow(host, session).await
            }
            ResumeOutcome::NotActivated => {
                host.shutdown().await;
                Err(CliError::NotActivated)
            }
        }
    })
}
