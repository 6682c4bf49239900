// Scripted provider for tests and offline demos.
//
// Returns a fixed result, optionally after a delay (to exercise council
// timeouts) or as a failure (to exercise fallback paths). Lives in the
// library rather than a test module so the CLI demo and integration tests
// can both wire councils from it.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Duration;

use super::traits::{ProviderInfo, RemoteProvider};
use crate::types::{CategoryScores, ProviderResult};

pub struct MockProvider {
    name: String,
    flagged: bool,
    confidence: f64,
    categories: CategoryScores,
    delay: Option<Duration>,
    fail: bool,
    available: bool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, flagged: bool, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            flagged,
            confidence,
            categories: CategoryScores::new(),
            delay: None,
            fail: false,
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_categories(mut self, categories: CategoryScores) -> Self {
        self.categories = categories;
        self
    }

    /// Sleep this long before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every analyze() call returns an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteProvider for MockProvider {
    async fn analyze(&self, _text: &str) -> Result<ProviderResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("mock provider {} configured to fail", self.name);
        }
        Ok(ProviderResult {
            provider: self.name.clone(),
            flagged: self.flagged,
            confidence: self.confidence,
            categories: self.categories.clone(),
            latency_ms: self.delay.map(|d| d.as_millis() as u64).unwrap_or(1),
        })
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            description: "scripted mock provider".to_string(),
        }
    }
}
