//! Optional observability helpers for token exchanges.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `thing_oauth2.exchange` with a `stage`
//!   field and `debug` diagnostics for every failed exchange.
//! - Enable `metrics` to increment the `thing_oauth2_exchange_total` counter for every
//!   attempt/success/failure/coalesced outcome, labeled by `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeOutcome {
	/// Entry to the exchange.
	Attempt,
	/// A fresh token was stored.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Caller reused a token minted by a concurrent exchange.
	Coalesced,
}
impl ExchangeOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExchangeOutcome::Attempt => "attempt",
			ExchangeOutcome::Success => "success",
			ExchangeOutcome::Failure => "failure",
			ExchangeOutcome::Coalesced => "coalesced",
		}
	}
}
impl Display for ExchangeOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
