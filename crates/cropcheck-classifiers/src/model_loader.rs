//! Model loading for Candle-based leaf classifiers

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use cropcheck_core::{Error, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};

/// Tensor holding the classification head weights, `[classes, features]`
pub const HEAD_WEIGHT: &str = "head.weight";

/// Tensor holding the classification head bias, `[classes]`
pub const HEAD_BIAS: &str = "head.bias";

/// Configuration for loading Candle models
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Source of the model
    pub source: ModelSource,

    /// Device to run inference on
    pub device: DeviceType,

    /// Side length, in pixels, of the square RGB input
    pub input_size: usize,
}

/// Source location for model weights
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Load from local file system
    LocalPath(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
        filename: String,
    },
}

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: ModelSource::LocalPath(PathBuf::new()),
            device: DeviceType::Cpu,
            input_size: 224,
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration from local path
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ModelSource::LocalPath(path.into()),
            ..Default::default()
        }
    }

    /// Create a new model configuration from Hugging Face
    pub fn from_hf(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            source: ModelSource::HuggingFace {
                repo_id: repo_id.into(),
                revision: None,
                filename: filename.into(),
            },
            ..Default::default()
        }
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.device = device;
        self
    }

    /// Set the square input side length
    pub fn with_input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    /// Set Hugging Face revision
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        if let ModelSource::HuggingFace { repo_id, filename, .. } = self.source {
            self.source = ModelSource::HuggingFace {
                repo_id,
                revision: Some(revision.into()),
                filename,
            };
        }
        self
    }

    /// Human readable description of where the weights come from
    pub fn describe_source(&self) -> String {
        match &self.source {
            ModelSource::LocalPath(path) => path.display().to_string(),
            ModelSource::HuggingFace {
                repo_id, filename, ..
            } => format!("hf://{}/{}", repo_id, filename),
        }
    }
}

/// Loaded Candle weights, ready for building layers
pub struct LoadedModel {
    var_builder: VarBuilder<'static>,
    device: Device,
    metadata: ModelMetadata,
    weights_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model name/identifier
    pub name: String,

    /// Length of the flattened input vector
    pub num_features: usize,

    /// Number of output classes
    pub num_classes: usize,
}

impl LoadedModel {
    /// Load a model from configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let weights_path = Self::resolve_model_path(config)?;
        let device = Self::create_device(config.device)?;

        let tensors = candle_core::safetensors::load(&weights_path, &device)
            .map_err(|e| Error::classifier(format!("Failed to load SafeTensors: {}", e)))?;

        let (num_classes, num_features) = match tensors.get(HEAD_WEIGHT) {
            Some(weight) => weight.dims2().map_err(|e| {
                Error::classifier(format!("'{}' is not a matrix: {}", HEAD_WEIGHT, e))
            })?,
            None => {
                return Err(Error::classifier(format!(
                    "Model {:?} has no '{}' tensor",
                    weights_path, HEAD_WEIGHT
                )))
            }
        };

        let metadata = ModelMetadata {
            name: Self::model_name(&weights_path),
            num_features,
            num_classes,
        };

        tracing::debug!(
            model = %metadata.name,
            num_features,
            num_classes,
            "loaded model weights"
        );

        let var_builder = VarBuilder::from_tensors(tensors, DType::F32, &device);

        Ok(Self {
            var_builder,
            device,
            metadata,
            weights_path,
        })
    }

    /// Resolve model path from source
    fn resolve_model_path(config: &ModelConfig) -> Result<PathBuf> {
        match &config.source {
            ModelSource::LocalPath(path) => {
                if !path.exists() {
                    return Err(Error::config(format!("Model file not found: {:?}", path)));
                }
                Ok(path.clone())
            }
            ModelSource::HuggingFace {
                repo_id,
                revision,
                filename,
            } => {
                let api = Api::new()
                    .map_err(|e| Error::config(format!("Failed to initialize HF API: {}", e)))?;

                let repo = api.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    revision.clone().unwrap_or_else(|| "main".to_string()),
                ));

                repo.get(filename)
                    .map_err(|e| Error::config(format!("Failed to download model from HF: {}", e)))
            }
        }
    }

    /// Create Candle device from device type
    fn create_device(device_type: DeviceType) -> Result<Device> {
        match device_type {
            DeviceType::Cpu => Ok(Device::Cpu),
            DeviceType::Cuda(idx) => Device::new_cuda(idx)
                .map_err(|e| Error::classifier(format!("Failed to create CUDA device: {}", e))),
            DeviceType::Metal(idx) => Device::new_metal(idx)
                .map_err(|e| Error::classifier(format!("Failed to create Metal device: {}", e))),
        }
    }

    fn model_name(weights_path: &Path) -> String {
        weights_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Get reference to VarBuilder for building model layers
    pub fn var_builder(&self) -> &VarBuilder<'static> {
        &self.var_builder
    }

    /// Get reference to the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get model metadata
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Get weights path
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_local() {
        let config = ModelConfig::from_local("/path/to/leaf.safetensors")
            .with_device(DeviceType::Cpu)
            .with_input_size(64);

        assert!(matches!(config.source, ModelSource::LocalPath(_)));
        assert_eq!(config.input_size, 64);
        assert_eq!(config.describe_source(), "/path/to/leaf.safetensors");
    }

    #[test]
    fn test_model_config_hf() {
        let config = ModelConfig::from_hf("cropcheck/plant-village-head", "model.safetensors")
            .with_revision("v2")
            .with_device(DeviceType::Cpu);

        if let ModelSource::HuggingFace {
            repo_id,
            revision,
            filename,
        } = &config.source
        {
            assert_eq!(repo_id, "cropcheck/plant-village-head");
            assert_eq!(revision.as_deref(), Some("v2"));
            assert_eq!(filename, "model.safetensors");
        } else {
            panic!("Expected HuggingFace source");
        }
        assert_eq!(
            config.describe_source(),
            "hf://cropcheck/plant-village-head/model.safetensors"
        );
    }

    #[test]
    fn test_revision_ignored_for_local() {
        let config = ModelConfig::from_local("leaf.safetensors").with_revision("main");
        assert!(matches!(config.source, ModelSource::LocalPath(_)));
    }

    #[test]
    fn test_missing_local_model_is_config_error() {
        let config = ModelConfig::from_local("/definitely/not/here.safetensors");
        let err = LoadedModel::load(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
