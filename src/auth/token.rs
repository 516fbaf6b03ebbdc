//! Token secrets and the issued-token snapshot with its expiry arithmetic.

pub mod secret;
pub mod state;
