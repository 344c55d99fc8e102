//! Multi-registrar orchestration
//!
//! Both passes walk the registrars in the order the caller gives them. That
//! order is operator preference (cost, reliability), so it is never changed.
//!
//! ## Check pass
//!
//! ```text
//! registrars:  [A ok] [B err] [C ok]
//! results:     [A]            [C]      (input order, successes only)
//! errors:             [B]              (Some only if something failed)
//! ```
//!
//! ## Register pass
//!
//! ```text
//! registrars:  [A err] [B unavailable] [C owned] [D ...]
//! result:                              [C]      (D is never called)
//! errors:      [A]
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AggregatedError, BackendError};
use crate::status::{CheckResult, Status};
use crate::traits::Registrar;

/// Ask every registrar, in order, whether `domain` is available
///
/// A failing registrar is recorded in the aggregated error and skipped;
/// iteration never stops early. The result list is the subsequence of
/// registrars that answered, in input order.
pub async fn check_pass(
    domain: &str,
    registrars: &[Arc<dyn Registrar>],
) -> (Vec<CheckResult>, Option<AggregatedError>) {
    let mut results = Vec::with_capacity(registrars.len());
    let mut errors = AggregatedError::new(format!("availability check for '{}' failed", domain));

    for (position, registrar) in registrars.iter().enumerate() {
        match registrar.check_availability(domain).await {
            Ok(status) => {
                debug!("{} reports {} as {}", registrar.name(), domain, status);
                results.push(CheckResult::new(registrar.name(), status, domain));
            }
            Err(e) => {
                warn!(
                    "Received error from registrar '{}' while checking domain '{}': {}",
                    registrar.name(),
                    domain,
                    e
                );
                errors.push(BackendError::new(registrar.name(), position, e));
            }
        }
    }

    (results, errors.into_option())
}

/// Try to register `domain` at the first registrar willing to claim it
///
/// Returns at the first registrar whose `register` call yields
/// [`Status::Owned`] or [`Status::Processing`]; later registrars are not
/// called. Failures before that point are still reported. When nobody
/// claims the domain the result is `None`, and the error is `Some` only if
/// at least one call failed.
pub async fn register_pass(
    domain: &str,
    registrars: &[Arc<dyn Registrar>],
) -> (Option<CheckResult>, Option<AggregatedError>) {
    let mut errors = AggregatedError::new(format!("registration of '{}' failed", domain));

    for (position, registrar) in registrars.iter().enumerate() {
        match registrar.register(domain).await {
            Ok(status) if status.is_claimed() => {
                let claimed = CheckResult::new(registrar.name(), status, domain);
                return (Some(claimed), errors.into_option());
            }
            Ok(status) => {
                debug!("{} declined to register {} ({})", registrar.name(), domain, status);
            }
            Err(e) => {
                warn!(
                    "Received error from registrar '{}' while trying to register domain '{}': {}",
                    registrar.name(),
                    domain,
                    e
                );
                errors.push(BackendError::new(registrar.name(), position, e));
            }
        }
    }

    (None, errors.into_option())
}

/// The first result reporting [`Status::Available`], if any
pub fn first_available(results: &[CheckResult]) -> Option<&CheckResult> {
    results.iter().find(|r| r.status == Status::Available)
}
