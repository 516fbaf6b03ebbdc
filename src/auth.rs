//! Credential sets, the readiness predicate, and token state models.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::{secret::*, state::*};
