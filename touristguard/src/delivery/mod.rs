//! Delivery Queue & Uplink.
//!
//! Buffers location samples for one identity and pushes them to the remote
//! collector with at-least-once semantics.
//!
//! # Components
//!
//! - [`DeliveryQueue`] - non-blocking enqueue, retry bookkeeping, coalescing
//! - [`DeliveryDispatcher`] - async flush worker over a [`LocationUplink`]
//! - [`retry_delay`] - exponential backoff floored at the sample cadence
//!
//! # Guarantees
//!
//! - At most one attempt per envelope is outstanding at any time
//! - Transient failures are retried, never faster than `min_retry_interval`
//! - Every envelope that is not acknowledged is counted in
//!   [`DeliveryStats::dropped`]

mod backoff;
mod config;
mod dispatcher;
mod envelope;
mod error;
mod queue;
mod uplink;

pub use backoff::retry_delay;
pub use config::{
    DeliveryConfig, DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAX_BACKOFF, DEFAULT_RETENTION_CEILING,
};
pub use dispatcher::{DeliveryDispatcher, DrainReport, FlushReport};
pub use envelope::DeliveryEnvelope;
pub use error::DeliveryError;
pub use queue::{Completion, DeliveryQueue, DeliveryStats};
pub use uplink::LocationUplink;
