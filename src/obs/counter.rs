// self
use crate::obs::ExchangeOutcome;

/// Records an exchange outcome via the global metrics recorder (when enabled).
pub fn record_exchange_outcome(outcome: ExchangeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("thing_oauth2_exchange_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_exchange_outcome_without_recorder_is_noop() {
		record_exchange_outcome(ExchangeOutcome::Failure);
	}
}
