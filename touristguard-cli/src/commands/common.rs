//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use touristguard::location::{
    AccuracyTier, FixedPositionProvider, LocationSample, PositionProvider, ProviderError,
    ScriptedPositionProvider,
};
use touristguard::permissions::StaticPermissions;

use crate::error::CliError;

/// Where positions come from on a host without a GPS receiver.
#[derive(Debug, Clone, Default, Args)]
pub struct PositionArgs {
    /// Replay a recorded track (JSON array of samples)
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub track: Option<PathBuf>,

    /// Fixed latitude in decimal degrees
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Fixed longitude in decimal degrees
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Answer the background location prompt with "deny"
    #[arg(long)]
    pub deny_background: bool,
}

impl PositionArgs {
    /// Build the position provider selected by the arguments.
    pub fn provider(&self) -> Result<HostProvider, CliError> {
        if let Some(path) = &self.track {
            let json = std::fs::read_to_string(path).map_err(|e| CliError::Track {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let provider =
                ScriptedPositionProvider::from_json(&json).map_err(|e| CliError::Track {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            if provider.remaining() == 0 {
                return Err(CliError::Track {
                    path: path.clone(),
                    reason: "track contains no samples".to_string(),
                });
            }
            return Ok(HostProvider::Scripted(provider));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(HostProvider::Fixed(FixedPositionProvider::new(lat, lon))),
            _ => Err(CliError::Config(
                "No position source. Use --track <FILE> or --lat/--lon".to_string(),
            )),
        }
    }

    /// Permission policy for this host.
    pub fn permissions(&self) -> StaticPermissions {
        if self.deny_background {
            StaticPermissions::foreground_only()
        } else {
            StaticPermissions::granted()
        }
    }
}

/// Position providers available to the CLI.
#[derive(Debug)]
pub enum HostProvider {
    Fixed(FixedPositionProvider),
    Scripted(ScriptedPositionProvider),
}

impl PositionProvider for HostProvider {
    async fn current_fix(&self, accuracy: AccuracyTier) -> Result<LocationSample, ProviderError> {
        match self {
            HostProvider::Fixed(provider) => provider.current_fix(accuracy).await,
            HostProvider::Scripted(provider) => provider.current_fix(accuracy).await,
        }
    }
}
