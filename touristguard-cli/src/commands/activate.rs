//! Activate command - validate an identity, request permissions and track.

use super::common::PositionArgs;
use super::tracking;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the activate command.
pub struct ActivateArgs {
    pub id: String,
    pub position: PositionArgs,
    pub verbose: bool,
}

/// Run the activate command.
pub fn run(args: ActivateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("activate");
    let runtime = runner.runtime()?;

    runtime.block_on(async {
        let host = runner.tracking_host(&args.position)?;

        println!("Activating {}...", args.id.trim());
        let session = match host.controller.activate(&args.id).await {
            Ok(session) => session,
            Err(e) => {
                host.shutdown().await;
                return Err(e.into());
            }
        };
        println!("Activation complete");
        println!();

        tracking::follow(host, session).await
    })
}
