//! Bounded, time-limited access to a shared classifier
//!
//! Inference runs in its own task holding a semaphore permit. When a caller
//! gives up on a timeout the task keeps running to completion and only then
//! releases its permit, so the configured concurrency bound holds for the
//! model even when callers have already moved on.

use crate::classifier::{InferenceOutput, LeafClassifier};
use cropcheck_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Runtime settings for [`ClassifierDispatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on waiting for a slot plus running the model
    pub timeout: Duration,

    /// Number of inferences allowed in flight
    pub max_concurrent: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrent: 1,
        }
    }
}

/// Shares one classifier across request handlers
#[derive(Clone)]
pub struct ClassifierDispatcher {
    classifier: Arc<dyn LeafClassifier>,
    permits: Arc<Semaphore>,
    config: DispatchConfig,
}

impl ClassifierDispatcher {
    /// Create a dispatcher with the given settings
    pub fn new(classifier: Arc<dyn LeafClassifier>, config: DispatchConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            classifier,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            config: DispatchConfig {
                max_concurrent,
                ..config
            },
        }
    }

    /// Run the classifier on an encoded image
    pub async fn classify(&self, image: Vec<u8>) -> Result<InferenceOutput> {
        let start = Instant::now();
        let deadline = start + self.config.timeout;

        let permit = match tokio::time::timeout_at(
            deadline,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(Error::unavailable("classifier is shutting down")),
            Err(_) => {
                tracing::warn!(
                    classifier = self.classifier.name(),
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "timed out waiting for an inference slot"
                );
                return Err(Error::Timeout);
            }
        };

        let classifier = Arc::clone(&self.classifier);
        let task = tokio::spawn(async move {
            let _permit = permit;
            classifier.predict(&image).await
        });

        let probabilities = match tokio::time::timeout_at(deadline, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(Error::internal(format!("inference task failed: {}", e))),
            Err(_) => {
                tracing::warn!(
                    classifier = self.classifier.name(),
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "inference timed out"
                );
                return Err(Error::Timeout);
            }
        };

        let latency_us = start.elapsed().as_micros() as u64;
        metrics::histogram!("cropcheck_inference_latency_us").record(latency_us as f64);

        Ok(InferenceOutput::new(probabilities, latency_us))
    }

    /// The wrapped classifier
    pub fn classifier(&self) -> &Arc<dyn LeafClassifier> {
        &self.classifier
    }

    /// Settings in effect
    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Number of inference slots currently free
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}
