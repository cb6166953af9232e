//! Remote product-data service interface.
//!
//! The crawler only ever talks to a [`ProductDataService`]: per-node search,
//! details and substructure calls. Any failure maps to a [`RemoteError`] and
//! is treated by callers as "no data for this node".

#[cfg(feature = "remote")]
mod client;

#[cfg(feature = "remote")]
pub use client::{HttpClientConfig, HttpProductClient};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The service answered but had nothing for the request
    #[error("not found")]
    NotFound,
    /// Timeout, connection failure, or error status after retries
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Result of a remote call.
pub type RemoteResult = std::result::Result<Value, RemoteError>;

/// Read-only access to a hierarchical product-data service.
///
/// Implementations must bound every call with a timeout.
///
/// # Example
///
/// ```ignore
/// use bom_tools::remote::{OfflineService, ProductDataService};
///
/// let service: Box<dyn ProductDataService> = match config.remote.base_url {
///     Some(url) => Box::new(HttpProductClient::new(client_config(url))?),
///     None => Box::new(OfflineService),
/// };
/// ```
pub trait ProductDataService {
    /// Search parts by number. Returns a list of candidate records.
    fn search(&self, number: &str, limit: usize) -> RemoteResult;

    /// Details of a part by opaque identifier.
    fn get_details(&self, id: &str) -> RemoteResult;

    /// Details of a part by number.
    fn get_details_by_number(&self, number: &str) -> RemoteResult;

    /// Substructure below a part, by identifier, up to `depth` levels.
    fn get_substructure(&self, id: &str, depth: usize) -> RemoteResult;

    /// Substructure below a part, by number, up to `depth` levels.
    fn get_substructure_by_number(&self, number: &str, depth: usize) -> RemoteResult;

    /// Name for logs.
    fn name(&self) -> &'static str {
        "product-data"
    }

    /// Whether calls can succeed at all.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: ProductDataService + ?Sized> ProductDataService for &T {
    fn search(&self, number: &str, limit: usize) -> RemoteResult {
        (**self).search(number, limit)
    }
    fn get_details(&self, id: &str) -> RemoteResult {
        (**self).get_details(id)
    }
    fn get_details_by_number(&self, number: &str) -> RemoteResult {
        (**self).get_details_by_number(number)
    }
    fn get_substructure(&self, id: &str, depth: usize) -> RemoteResult {
        (**self).get_substructure(id, depth)
    }
    fn get_substructure_by_number(&self, number: &str, depth: usize) -> RemoteResult {
        (**self).get_substructure_by_number(number, depth)
    }
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: ProductDataService + ?Sized> ProductDataService for Box<T> {
    fn search(&self, number: &str, limit: usize) -> RemoteResult {
        (**self).search(number, limit)
    }
    fn get_details(&self, id: &str) -> RemoteResult {
        (**self).get_details(id)
    }
    fn get_details_by_number(&self, number: &str) -> RemoteResult {
        (**self).get_details_by_number(number)
    }
    fn get_substructure(&self, id: &str, depth: usize) -> RemoteResult {
        (**self).get_substructure(id, depth)
    }
    fn get_substructure_by_number(&self, number: &str, depth: usize) -> RemoteResult {
        (**self).get_substructure_by_number(number, depth)
    }
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// A service that has nothing.
///
/// Used for offline runs and when no endpoint is configured, so the crawler
/// never needs to special-case a missing service.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineService;

impl ProductDataService for OfflineService {
    fn search(&self, _number: &str, _limit: usize) -> RemoteResult {
        Err(RemoteError::Unavailable("offline".into()))
    }
    fn get_details(&self, _id: &str) -> RemoteResult {
        Err(RemoteError::Unavailable("offline".into()))
    }
    fn get_details_by_number(&self, _number: &str) -> RemoteResult {
        Err(RemoteError::Unavailable("offline".into()))
    }
    fn get_substructure(&self, _id: &str, _depth: usize) -> RemoteResult {
        Err(RemoteError::Unavailable("offline".into()))
    }
    fn get_substructure_by_number(&self, _number: &str, _depth: usize) -> RemoteResult {
        Err(RemoteError::Unavailable("offline".into()))
    }
    fn name(&self) -> &'static str {
        "offline"
    }
    fn is_available(&self) -> bool {
        false
    }
}

/// Tool names used by the JSON-RPC client, each an ordered fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RemoteTools {
    /// Part search by number
    pub search: Vec<String>,
    /// Part details by identifier
    pub details: Vec<String>,
    /// Part substructure by identifier
    pub structure: Vec<String>,
}

impl Default for RemoteTools {
    fn default() -> Self {
        Self {
            search: vec!["partmgmt_search_parts".into(), "search_parts".into()],
            details: vec!["partmgmt_get_part".into(), "get_part".into()],
            structure: vec![
                "partmgmt_get_part_structure".into(),
                "partmgmt_get_bom".into(),
                "get_part_structure".into(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_service_has_nothing() {
        let service = OfflineService;
        assert_eq!(service.name(), "offline");
        assert!(!service.is_available());
        assert!(matches!(
            service.get_substructure("OR:1", 3),
            Err(RemoteError::Unavailable(_))
        ));
        assert!(service.search("100", 10).is_err());
    }

    #[test]
    fn test_boxed_service_delegates() {
        let boxed: Box<dyn ProductDataService> = Box::new(OfflineService);
        assert_eq!(boxed.name(), "offline");
        assert!(boxed.get_details("x").is_err());
    }

    #[test]
    fn test_default_tools_have_fallbacks() {
        let tools = RemoteTools::default();
        assert_eq!(tools.search[0], "partmgmt_search_parts");
        assert!(tools.structure.len() > 1);
    }
}
