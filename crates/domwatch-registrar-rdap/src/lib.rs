// # RDAP Registrar
//
// A vendor-neutral, check-only registrar backend built on RDAP
// (Registration Data Access Protocol, RFC 9082/9083).
//
// ## Behavior
//
// - `check_availability`: `GET {base_url}/domain/{name}`
//   - 404: no registration record, the name is Available
//   - 200: a registration record exists, the name is Unavailable
//   - 429: rate limited (error)
//   - anything else: HTTP error
// - `register`: always `Error::Unsupported`. RDAP is read-only, so a
//   register pass falls through to the next registrar in the list.
//
// ## Trust Level: Untrusted (Registrar)
//
// Like every registrar, this backend is stateless and single-shot:
// - No retries (the watch loop simply tries again next pass)
// - No background tasks
// - No caching between calls
//
// ## API Reference
//
// - RFC 9082 lookup path: `/domain/<ldh name>`
// - Bootstrap service: https://rdap.org redirects to the authoritative server

use async_trait::async_trait;
use domwatch_core::config::RegistrarConfig;
use domwatch_core::registry::PluginRegistry;
use domwatch_core::traits::{Registrar, RegistrarFactory};
use domwatch_core::{Error, Result, Status};
use serde::Deserialize;
use std::time::Duration;

/// Default RDAP endpoint (bootstrap redirector)
pub const DEFAULT_BASE_URL: &str = "https://rdap.org";

/// Default HTTP timeout for lookups (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Subset of an RDAP domain object, used for logging only
#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(rename = "ldhName")]
    ldh_name: Option<String>,

    #[serde(default)]
    status: Vec<String>,
}

/// Check-only registrar backed by an RDAP server
///
/// # Trust Level: Untrusted
///
/// Isolated and single-shot. Scheduling and retries belong to the watch loop.
#[derive(Debug)]
pub struct RdapRegistrar {
    /// Instance name used in results and errors
    name: String,

    /// RDAP base URL without trailing slash
    base_url: String,

    /// HTTP client for lookups
    client: reqwest::Client,
}

impl RdapRegistrar {
    /// Create a new RDAP registrar
    ///
    /// # Parameters
    ///
    /// - `name`: Instance name (appears in logs and check results)
    /// - `base_url`: RDAP server, e.g. `https://rdap.org`
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::config(format!(
                "RDAP base URL must be http(s): {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(concat!("domwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            base_url,
            client,
        })
    }

    /// The lookup URL for `domain`
    pub fn lookup_url(&self, domain: &str) -> String {
        format!("{}/domain/{}", self.base_url, domain.to_ascii_lowercase())
    }
}

/// Map an RDAP lookup response code to an availability status
fn status_from_http(code: u16) -> Result<Status> {
    match code {
        200 => Ok(Status::Unavailable),
        404 => Ok(Status::Available),
        429 => Err(Error::rate_limited("RDAP server rate limit exceeded")),
        400 => Err(Error::invalid_input("RDAP server rejected the lookup (400)")),
        500..=599 => Err(Error::http(format!("RDAP server error (transient): {}", code))),
        _ => Err(Error::http(format!("Unexpected RDAP response status: {}", code))),
    }
}

#[async_trait]
impl Registrar for RdapRegistrar {
    async fn check_availability(&self, domain: &str) -> Result<Status> {
        let url = self.lookup_url(domain);
        tracing::debug!("RDAP lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/rdap+json")
            .send()
            .await
            .map_err(|e| Error::http(format!("RDAP request failed: {}", e)))?;

        let code = response.status().as_u16();
        let status = status_from_http(code)?;

        if code == 200 {
            // The record itself does not change the verdict
            match response.json::<RdapDomain>().await {
                Ok(record) => tracing::debug!(
                    "{} is registered as {} ({})",
                    domain,
                    record.ldh_name.as_deref().unwrap_or(domain),
                    record.status.join(", ")
                ),
                Err(e) => tracing::debug!("Unparseable RDAP record for {}: {}", domain, e),
            }
        }

        Ok(status)
    }

    async fn register(&self, domain: &str) -> Result<Status> {
        tracing::debug!("{} cannot register {}: RDAP is read-only", self.name, domain);
        Err(Error::unsupported("RDAP backends cannot register domains"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory for RDAP registrars
///
/// Recognized settings:
/// - `base_url` (optional, default [`DEFAULT_BASE_URL`])
pub struct RdapRegistrarFactory;

impl RegistrarFactory for RdapRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        let base_url = config.setting_str("base_url").unwrap_or(DEFAULT_BASE_URL);
        Ok(Box::new(RdapRegistrar::new(config.name.as_str(), base_url)?))
    }
}

/// Register the RDAP backend with the plugin registry under kind `rdap`
pub fn register(registry: &PluginRegistry) {
    registry.register_registrar("rdap", Box::new(RdapRegistrarFactory));
}
