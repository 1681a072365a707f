//! Reset command - forget the stored identity.
//!
//! Tracking sessions live only as long as the `activate`/`run` process.
//! Clearing the identity file is all this process does; a tracking process
//! running elsewhere notices the cleared file on its next identity check
//! and stops its session.

use touristguard::config::ConfigFile;
use touristguard::identity::{FileIdentityStore, IdentityStore};

use super::tracking;
use crate::error::CliError;

/// Run the reset command.
pub fn run() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let store = FileIdentityStore::new(config.storage.identity_file.clone());

    match store.load().map_err(CliError::Identity)? {
        Some(token) => {
            store.clear().map_err(CliError::Identity)?;
            println!("Identity {} removed. Tracking is disabled.", token);
            println!(
                "A running `activate` or `run` stops within {}s.",
                tracking::IDENTITY_CHECK_INTERVAL.as_secs()
            );
        }
        None => println!("No identity stored."),
    }

    Ok(())
}
