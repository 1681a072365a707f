//! Location Sample Source.
//!
//! Produces timestamped [`LocationSample`]s at a configured cadence, in the
//! foreground and while backgrounded, behind the [`LocationSource`] port.
//!
//! # Components
//!
//! - [`LocationSource`] - registration-based sampling port
//! - [`PollingLocationSource`] - interval-driven implementation over a
//!   [`PositionProvider`]
//! - [`FixedPositionProvider`] / [`ScriptedPositionProvider`] - host providers
//!
//! # Usage
//!
//! ```ignore
//! let source = PollingLocationSource::new(FixedPositionProvider::new(28.61, 77.20));
//! let (tx, mut rx) = mpsc::channel(64);
//!
//! source.start_updates(Registration { identity, config: SamplingConfig::default() }, tx).await?;
//! while let Some(event) = rx.recv().await {
//!     // SourceEvent::Sample / Degraded / Restored
//! }
//! ```

mod config;
mod polling;
mod provider;
mod sample;
mod source;

pub use config::{
    AccuracyTier, SamplingConfig, DEFAULT_DEFERRED_INTERVAL, DEFAULT_SAMPLE_INTERVAL,
};
pub use polling::PollingLocationSource;
pub use provider::{
    BackgroundCapability, FixedPositionProvider, PositionProvider, ProviderError,
    ScriptedPositionProvider,
};
pub use sample::LocationSample;
pub use source::{DegradeReason, LocationSource, Registration, SourceError, SourceEvent};
