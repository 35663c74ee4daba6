//! CropCheck Classifiers
//!
//! Everything between an uploaded leaf image and a ranked list of class
//! labels:
//! - [`LeafClassifier`]: the adapter trait the service talks to, so tests and
//!   alternative runtimes can substitute the model
//! - [`CandleLeafClassifier`]: Candle-backed implementation loading
//!   SafeTensors weights from disk or the Hugging Face Hub
//! - [`ClassifierDispatcher`]: bounds concurrent inference and enforces a
//!   per-call timeout
//! - [`ranking`]: top-K selection and health scoring over the probability
//!   vector
//!
//! Ranking is pure and allocation-light; the dispatcher is the only piece
//! holding shared state.

pub mod candle;
pub mod classes;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod model_loader;
pub mod ranking;

pub use candle::CandleLeafClassifier;
pub use classes::{load_class_names, plant_village_classes, PLANT_VILLAGE_CLASSES};
pub use classifier::{InferenceOutput, LeafClassifier};
pub use config::{DeviceSpec, ModelConfigSpec, ModelSourceSpec};
pub use dispatch::{ClassifierDispatcher, DispatchConfig};
pub use model_loader::{DeviceType, LoadedModel, ModelConfig, ModelMetadata, ModelSource};
pub use ranking::{assess_health, rank, rank_top_k, TOP_K};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{InferenceOutput, LeafClassifier};
    pub use crate::dispatch::{ClassifierDispatcher, DispatchConfig};
    pub use crate::ranking::{assess_health, rank};
}
