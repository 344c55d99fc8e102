// # Registrar Trait
//
// Defines the interface every registration backend adapter implements.
//
// ## Implementations
//
// - RDAP (check-only): `domwatch-registrar-rdap` crate
// - Vendor APIs (TransIP, Gandi, ...): separate adapter crates
//
// ## Usage
//
// ```rust,ignore
// use domwatch_core::{Registrar, Status};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registrar = /* Registrar implementation */;
//
//     if registrar.check_availability("example.com").await? == Status::Available {
//         registrar.register("example.com").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::status::Status;

/// Trait for registration backend implementations
///
/// Each vendor adapter implements exactly these operations; ordering,
/// fallback and error aggregation across backends live in
/// [`crate::orchestrator`], never in an adapter.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to their own endpoints
/// - ✅ Translate vendor answers into a [`Status`]
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads (violates shutdown determinism)
/// - ❌ Retry or back off (the watch loop runs again next interval)
/// - ❌ Touch the watch-list or other registrars
///
/// A returned `Status` is meaningful only on `Ok`.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Ask the backend whether `domain` can be claimed
    ///
    /// Must not have side effects.
    ///
    /// # Returns
    ///
    /// - `Ok(Status)`: The backend's view of the domain
    /// - `Err(Error)`: The backend could not answer
    async fn check_availability(&self, domain: &str) -> Result<Status, crate::Error>;

    /// Try to register `domain`
    ///
    /// # Idempotency
    ///
    /// Calling this for a domain the backend already owns on our behalf
    /// returns `Ok(Status::Owned)`, not an error.
    ///
    /// # Returns
    ///
    /// - `Ok(Status::Owned | Status::Processing)`: The domain is ours or on its way
    /// - `Ok(_)`: The backend declined
    /// - `Err(Error)`: The call failed
    async fn register(&self, domain: &str) -> Result<Status, crate::Error>;

    /// Name of this registrar instance (for logging and results)
    fn name(&self) -> &str;
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    /// Create a Registrar instance from configuration
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
    ) -> Result<Box<dyn Registrar>, crate::Error>;
}
