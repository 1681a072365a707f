//! Identity Token and its durable storage.
//!
//! The token is process-wide but never read ambiently: it is loaded once by
//! the activation controller and passed explicitly to the tracking session,
//! which hands it to the delivery queue as configuration.

mod store;
mod token;

pub use store::{FileIdentityStore, IdentityStore, IdentityStoreError, MemoryIdentityStore};
pub use token::{EmptyToken, IdentityToken};
