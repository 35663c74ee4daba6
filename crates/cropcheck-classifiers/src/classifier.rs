//! Classifier trait and common types

use async_trait::async_trait;
use cropcheck_core::Result;

/// Adapter over an image classification model.
///
/// Implementations are constructed once at startup and shared read-only
/// across requests. Whether concurrent calls are safe is up to the
/// implementation; callers go through
/// [`ClassifierDispatcher`](crate::ClassifierDispatcher), which serializes
/// them unless configured otherwise.
#[async_trait]
pub trait LeafClassifier: Send + Sync {
    /// Classify an encoded image, returning one probability per class
    async fn predict(&self, image: &[u8]) -> Result<Vec<f32>>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Shape of a single model input, batch dimension first
    fn input_shape(&self) -> Vec<usize>;

    /// Shape of a single model output, batch dimension first
    fn output_shape(&self) -> Vec<usize>;

    /// Number of classes in the output vector
    fn num_classes(&self) -> usize {
        self.output_shape().last().copied().unwrap_or(0)
    }
}

/// Probability vector plus how long the model took to produce it
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    /// One probability per class, in model order
    pub probabilities: Vec<f32>,

    /// Latency in microseconds, including time spent waiting for a slot
    pub latency_us: u64,
}

impl InferenceOutput {
    /// Create a new inference output
    pub fn new(probabilities: Vec<f32>, latency_us: u64) -> Self {
        Self {
            probabilities,
            latency_us,
        }
    }
}
