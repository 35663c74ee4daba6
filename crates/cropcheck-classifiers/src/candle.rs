//! Candle-backed leaf classifier
//!
//! The model is a linear classification head over the raw pixel vector of
//! a square RGB image. Images are resized to `input_size x input_size`,
//! scaled to `[0, 1]` and flattened channels-last before the forward pass.

use crate::classifier::LeafClassifier;
use crate::model_loader::{LoadedModel, ModelConfig};
use async_trait::async_trait;
use candle_core::{Device, Module, Tensor};
use candle_nn::Linear;
use cropcheck_core::{Error, Result};
use image::imageops::FilterType;
use std::sync::Arc;
use std::time::Instant;

/// Image classifier running a safetensors classification head on Candle
pub struct CandleLeafClassifier {
    name: String,
    head: Arc<Linear>,
    device: Device,
    input_size: usize,
    num_classes: usize,
}

impl CandleLeafClassifier {
    /// Load weights described by `config` and build the classification head
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model = LoadedModel::load(config)?;
        Self::from_loaded(&model, config.input_size)
    }

    /// Build the classifier from already loaded weights
    pub fn from_loaded(model: &LoadedModel, input_size: usize) -> Result<Self> {
        let metadata = model.metadata();
        let expected = 3 * input_size * input_size;

        if metadata.num_features != expected {
            return Err(Error::config(format!(
                "Model '{}' expects {} input features, but a {}x{} RGB image has {}",
                metadata.name, metadata.num_features, input_size, input_size, expected
            )));
        }

        let head = candle_nn::linear(
            metadata.num_features,
            metadata.num_classes,
            model.var_builder().pp("head"),
        )
        .map_err(|e| Error::classifier(format!("Failed to build classification head: {}", e)))?;

        tracing::info!(
            model = %metadata.name,
            input_size,
            num_classes = metadata.num_classes,
            "leaf classifier ready"
        );

        Ok(Self {
            name: metadata.name.clone(),
            head: Arc::new(head),
            device: model.device().clone(),
            input_size,
            num_classes: metadata.num_classes,
        })
    }
}

/// Decode an encoded image into a flattened HWC vector scaled to `[0, 1]`
pub fn preprocess(bytes: &[u8], input_size: usize) -> Result<Vec<f32>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| Error::input(format!("could not decode image: {}", e)))?;

    let side = u32::try_from(input_size)
        .map_err(|_| Error::config(format!("input size {} is too large", input_size)))?;

    let rgb = decoded
        .resize_exact(side, side, FilterType::Triangle)
        .to_rgb8();

    Ok(rgb.into_raw().into_iter().map(|p| f32::from(p) / 255.0).collect())
}

fn forward(head: &Linear, device: &Device, pixels: Vec<f32>) -> Result<Vec<f32>> {
    let len = pixels.len();
    let input = Tensor::from_vec(pixels, (1, len), device)
        .map_err(|e| Error::classifier(format!("Failed to create input tensor: {}", e)))?;

    let logits = head
        .forward(&input)
        .map_err(|e| Error::classifier(format!("Forward pass failed: {}", e)))?;

    candle_nn::ops::softmax_last_dim(&logits)
        .and_then(|probs| probs.squeeze(0))
        .and_then(|probs| probs.to_vec1::<f32>())
        .map_err(|e| Error::classifier(format!("Failed to read probabilities: {}", e)))
}

#[async_trait]
impl LeafClassifier for CandleLeafClassifier {
    async fn predict(&self, image: &[u8]) -> Result<Vec<f32>> {
        let start = Instant::now();
        let head = Arc::clone(&self.head);
        let device = self.device.clone();
        let input_size = self.input_size;
        let image = image.to_vec();

        let probabilities = tokio::task::spawn_blocking(move || {
            let pixels = preprocess(&image, input_size)?;
            forward(&head, &device, pixels)
        })
        .await
        .map_err(|e| Error::internal(format!("inference task failed: {}", e)))??;

        tracing::debug!(
            model = %self.name,
            latency_us = start.elapsed().as_micros() as u64,
            "inference complete"
        );

        Ok(probabilities)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> Vec<usize> {
        vec![1, self.input_size, self.input_size, 3]
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![1, self.num_classes]
    }
}
