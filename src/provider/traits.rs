// Remote provider trait — the swap-ready abstraction.
//
// This trait defines the uniform contract over external classifiers. The
// engine never implements transport itself; concrete backends live behind
// this interface and the orchestrator only sees ProviderResult.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::ProviderResult;

/// Static metadata about a provider.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub name: String,
    pub description: String,
}

/// Trait for remote content classifiers. Implementations must be async
/// because real providers require HTTP calls.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Classify a single text, returning the uniform result shape.
    ///
    /// Implementations must map malformed upstream responses to a
    /// conservative default rather than propagating parse failures; an Err
    /// from this method means the call itself failed (network, auth) and the
    /// engine will fall back to its local result.
    async fn analyze(&self, text: &str) -> Result<ProviderResult>;

    /// Whether the provider is currently usable (configured, reachable).
    fn is_available(&self) -> bool;

    fn info(&self) -> ProviderInfo;
}
