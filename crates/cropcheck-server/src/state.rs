//! Shared application state

use anyhow::Result;
use cropcheck_advisory::{Advisor, Catalog};
use cropcheck_classifiers::{
    load_class_names, plant_village_classes, CandleLeafClassifier, ClassifierDispatcher,
    LeafClassifier, ModelConfigSpec,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Reference data plus the recommendation pipeline
    pub advisor: Advisor,

    /// Absent when no model is configured or it failed to load
    pub classifier: Option<ClassifierDispatcher>,

    /// Class names in model output order
    pub class_names: Arc<Vec<String>>,

    /// Where the model came from, for /health
    pub model_source: Option<String>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        advisor: Advisor,
        classifier: Option<ClassifierDispatcher>,
        class_names: Vec<String>,
    ) -> Self {
        Self {
            advisor,
            classifier,
            class_names: Arc::new(class_names),
            model_source: None,
            metrics_handle: None,
        }
    }

    pub fn with_model_source(mut self, source: impl Into<String>) -> Self {
        self.model_source = Some(source.into());
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Initialize application state from configuration.
    ///
    /// Reference data and class names must load. The model may not: the
    /// service then starts without one and reports it on /health and
    /// /predict.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        info!("Initializing application state");

        let catalog = Catalog::load(&config.data)?;
        let advisor = Advisor::new(Arc::new(catalog));

        let class_names = match config.model.as_ref().and_then(|m| m.class_names.as_ref()) {
            Some(path) => {
                info!("Loading class names from: {}", path.display());
                load_class_names(path)?
            }
            None => plant_village_classes(),
        };
        info!(classes = class_names.len(), "class names loaded");

        let Some(spec) = &config.model else {
            warn!("No model configured; /predict will be unavailable");
            return Ok(Self::new(advisor, None, class_names));
        };

        let source = spec.to_model_config().describe_source();
        let classifier = load_classifier(spec, class_names.len());

        Ok(Self::new(advisor, classifier, class_names).with_model_source(source))
    }
}

fn load_classifier(
    spec: &ModelConfigSpec,
    expected_classes: usize,
) -> Option<ClassifierDispatcher> {
    let model_config = spec.to_model_config();
    info!("Loading model from: {}", model_config.describe_source());

    let classifier = match CandleLeafClassifier::load(&model_config) {
        Ok(classifier) => classifier,
        Err(e) => {
            error!("Failed to load model: {}", e);
            return None;
        }
    };

    if classifier.num_classes() != expected_classes {
        // Every prediction will be rejected at the ranking stage
        warn!(
            model_classes = classifier.num_classes(),
            class_names = expected_classes,
            "model output size does not match the class name list"
        );
    }

    info!(
        classifier = classifier.name(),
        input_shape = ?classifier.input_shape(),
        output_shape = ?classifier.output_shape(),
        "model loaded"
    );

    Some(ClassifierDispatcher::new(
        Arc::new(classifier),
        spec.to_dispatch_config(),
    ))
}
