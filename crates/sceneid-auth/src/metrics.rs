//! Token lifecycle metrics
//!
//! - `sceneid_token_grants_total` (counter): labels `grant`, `outcome`
//!   (`granted` / `rejected`)
//! - `sceneid_token_refresh_retries_total` (counter): resource calls that hit
//!   `invalid_token` and went through refresh-and-retry
//!
//! Without an installed recorder these calls are no-ops.

use crate::token::Grant;

/// Record the outcome of a token endpoint call.
pub fn record_grant(grant: Grant, granted: bool) {
    let outcome = if granted { "granted" } else { "rejected" };
    metrics::counter!("sceneid_token_grants_total", "grant" => grant.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record one refresh-and-retry cycle on the resource path.
pub fn record_refresh_retry() {
    metrics::counter!("sceneid_token_refresh_retries_total").increment(1);
}
