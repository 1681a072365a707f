//! Permission & Activation Controller.
//!
//! Verifies permissions, validates and persists the Identity Token, and
//! owns the single running tracking session.

mod controller;
mod error;
mod validator;

pub use controller::{ActivationController, ActivationOptions, ResumeOutcome};
pub use error::ActivationError;
pub use validator::{IdentityValidator, TouristProfile, ValidationError};
