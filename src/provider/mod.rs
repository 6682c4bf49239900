// Remote classifier providers — trait-based abstraction over external
// backends, plus the closed set of provider kinds the engine can build.
//
// The provider set is explicit: a ProviderKind variant per supported
// backend shape, and a factory that returns the capability interface.
// Adding a backend means adding a variant, not registering a string key.

pub mod http;
pub mod mock;
pub mod rate_limiter;
pub mod traits;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use traits::RemoteProvider;

/// The closed set of provider kinds the engine knows how to construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderKind {
    /// Generic JSON-over-HTTP classifier endpoint
    Http {
        name: String,
        endpoint: String,
        api_key: Option<String>,
        qps: f64,
    },
    /// Scripted provider for demos and tests
    Mock { name: String, flagged: bool, confidence: f64 },
}

/// Build a provider from its kind description.
pub fn build_provider(kind: &ProviderKind) -> Result<Arc<dyn RemoteProvider>> {
    match kind {
        ProviderKind::Http {
            name,
            endpoint,
            api_key,
            qps,
        } => {
            if endpoint.is_empty() {
                anyhow::bail!("HTTP provider {name} has an empty endpoint");
            }
            Ok(Arc::new(http::HttpProvider::new(
                name,
                endpoint,
                api_key.clone(),
                *qps,
            )))
        }
        ProviderKind::Mock {
            name,
            flagged,
            confidence,
        } => Ok(Arc::new(mock::MockProvider::new(name, *flagged, *confidence))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_factory_rejects_empty_endpoint() {
        let kind = ProviderKind::Http {
            name: "x".into(),
            endpoint: String::new(),
            api_key: None,
            qps: 1.0,
        };
        assert!(build_provider(&kind).is_err());
    }

    #[tokio::test]
    async fn mock_factory_builds_working_provider() {
        let kind = ProviderKind::Mock {
            name: "m".into(),
            flagged: true,
            confidence: 0.8,
        };
        let provider = build_provider(&kind).unwrap();
        assert!(provider.is_available());
        let result = provider.analyze("anything").await.unwrap();
        assert!(result.flagged);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }
}
