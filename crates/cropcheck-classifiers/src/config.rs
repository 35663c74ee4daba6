//! Configuration for the leaf classifier and its dispatcher

use crate::{DeviceType, DispatchConfig, ModelConfig, ModelSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Model configuration specification (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigSpec {
    /// Model source specification
    #[serde(flatten)]
    pub source: ModelSourceSpec,

    /// Device to run inference on
    #[serde(default)]
    pub device: DeviceSpec,

    /// Side length of the square model input, in pixels
    #[serde(default = "default_input_size")]
    pub input_size: usize,

    /// JSON or YAML list of class names; defaults to the PlantVillage set
    #[serde(default)]
    pub class_names: Option<PathBuf>,

    /// Upper bound on a single inference, including queueing
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,

    /// Number of inferences allowed to run at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_inferences: usize,
}

/// Model source specification (for config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSourceSpec {
    /// Local file path
    Local { path: PathBuf },

    /// Hugging Face Hub
    HuggingFace {
        repo_id: String,
        filename: String,
        revision: Option<String>,
    },
}

/// Device specification (for config files)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda { index: Option<usize> },
    Metal { index: Option<usize> },
}

impl ModelConfigSpec {
    /// Spec pointing at a local weights file, everything else defaulted
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ModelSourceSpec::Local { path: path.into() },
            device: DeviceSpec::default(),
            input_size: default_input_size(),
            class_names: None,
            inference_timeout_ms: default_inference_timeout_ms(),
            max_concurrent_inferences: default_max_concurrent(),
        }
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Convert to ModelConfig for loading
    pub fn to_model_config(&self) -> ModelConfig {
        let source = match &self.source {
            ModelSourceSpec::Local { path } => ModelSource::LocalPath(path.clone()),
            ModelSourceSpec::HuggingFace {
                repo_id,
                filename,
                revision,
            } => ModelSource::HuggingFace {
                repo_id: repo_id.clone(),
                revision: revision.clone(),
                filename: filename.clone(),
            },
        };

        ModelConfig {
            source,
            device: self.device.to_device_type(),
            input_size: self.input_size,
        }
    }

    /// Convert to the dispatcher's runtime settings
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            timeout: Duration::from_millis(self.inference_timeout_ms),
            max_concurrent: self.max_concurrent_inferences.max(1),
        }
    }
}

impl DeviceSpec {
    /// Convert to DeviceType
    pub fn to_device_type(&self) -> DeviceType {
        match self {
            DeviceSpec::Cpu => DeviceType::Cpu,
            DeviceSpec::Cuda { index } => DeviceType::Cuda(index.unwrap_or(0)),
            DeviceSpec::Metal { index } => DeviceType::Metal(index.unwrap_or(0)),
        }
    }
}

fn default_input_size() -> usize {
    224
}

fn default_inference_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_model_yaml() {
        let yaml = r#"
path: ./models/plant_disease.safetensors
input_size: 128
inference_timeout_ms: 500
"#;

        let spec = ModelConfigSpec::from_yaml(yaml).unwrap();
        let model = spec.to_model_config();

        assert!(matches!(model.source, ModelSource::LocalPath(_)));
        assert_eq!(model.input_size, 128);
        assert_eq!(model.device, DeviceType::Cpu);

        let dispatch = spec.to_dispatch_config();
        assert_eq!(dispatch.timeout, Duration::from_millis(500));
        assert_eq!(dispatch.max_concurrent, 1);
    }

    #[test]
    fn test_hf_model_yaml() {
        let yaml = r#"
repo_id: cropcheck/plant-village-head
filename: model.safetensors
revision: v2
device:
  cuda:
    index: 1
max_concurrent_inferences: 4
"#;

        let spec = ModelConfigSpec::from_yaml(yaml).unwrap();
        let model = spec.to_model_config();

        match model.source {
            ModelSource::HuggingFace { repo_id, revision, .. } => {
                assert_eq!(repo_id, "cropcheck/plant-village-head");
                assert_eq!(revision.as_deref(), Some("v2"));
            }
            other => panic!("expected HuggingFace source, got {:?}", other),
        }
        assert_eq!(model.device, DeviceType::Cuda(1));
        assert_eq!(model.input_size, 224);
        assert_eq!(spec.to_dispatch_config().max_concurrent, 4);
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let mut spec = ModelConfigSpec::local("leaf.safetensors");
        spec.max_concurrent_inferences = 0;
        assert_eq!(spec.to_dispatch_config().max_concurrent, 1);
    }

    #[test]
    fn test_device_spec() {
        let spec: DeviceSpec = serde_yaml::from_str("cpu").unwrap();
        assert!(matches!(spec, DeviceSpec::Cpu));

        let cuda_device = DeviceSpec::Cuda { index: Some(1) }.to_device_type();
        assert_eq!(cuda_device, DeviceType::Cuda(1));

        let metal_device = DeviceSpec::Metal { index: None }.to_device_type();
        assert_eq!(metal_device, DeviceType::Metal(0));
    }
}
