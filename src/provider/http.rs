// Generic JSON-over-HTTP provider adapter.
//
// Speaks a uniform wire contract — POST {"text": ...} and get back
// {"flagged", "confidence", "categories": {name: score}} — so any backend
// that can be fronted with this shape plugs in without engine changes.
// A malformed response becomes a conservative default (not flagged,
// confidence 0.5) instead of a pipeline error.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use super::traits::{ProviderInfo, RemoteProvider};
use crate::types::{CategoryScores, ModerationCategory, ProviderResult};

/// HTTP-backed classifier provider.
pub struct HttpProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    rate_limiter: RateLimiter,
}

impl HttpProvider {
    pub fn new(name: &str, endpoint: &str, api_key: Option<String>, qps: f64) -> Self {
        Self {
            name: name.to_string(),
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key,
            rate_limiter: RateLimiter::new(qps),
        }
    }
}

#[async_trait]
impl RemoteProvider for HttpProvider {
    async fn analyze(&self, text: &str) -> Result<ProviderResult> {
        self.rate_limiter.acquire().await;
        let started = Instant::now();

        let mut request = self.client.post(&self.endpoint).json(&ClassifyRequest {
            text: text.to_string(),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to call provider {}", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Provider {} returned {}: {}", self.name, status, body);
        }

        let latency_ms = started.elapsed().as_millis() as u64;

        // Parse failures degrade to a conservative default instead of
        // propagating into the pipeline.
        let parsed: ClassifyResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(provider = %self.name, error = %e, "Malformed provider response, using conservative default");
                return Ok(ProviderResult {
                    provider: self.name.clone(),
                    flagged: false,
                    confidence: 0.5,
                    categories: CategoryScores::new(),
                    latency_ms,
                });
            }
        };

        let mut categories = CategoryScores::new();
        for (name, score) in &parsed.categories {
            if let Some(cat) = ModerationCategory::from_str(name) {
                categories.insert(cat, score.clamp(0.0, 1.0));
            }
        }

        debug!(
            provider = %self.name,
            flagged = parsed.flagged,
            confidence = parsed.confidence,
            latency_ms,
            "Provider result"
        );

        Ok(ProviderResult {
            provider: self.name.clone(),
            flagged: parsed.flagged,
            confidence: parsed.confidence.clamp(0.0, 1.0),
            categories,
            latency_ms,
        })
    }

    fn is_available(&self) -> bool {
        !self.endpoint.is_empty()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            description: format!("HTTP classifier at {}", self.endpoint),
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct ClassifyRequest {
    text: String,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    flagged: bool,
    confidence: f64,
    #[serde(default)]
    categories: HashMap<String, f64>,
}
