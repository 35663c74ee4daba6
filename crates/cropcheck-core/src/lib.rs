//! CropCheck Core
//!
//! Core types, traits, and utilities shared across CropCheck components.
//!
//! This crate provides:
//! - The per-request data model (class probabilities, rankings, prediction
//!   results, dosage estimates)
//! - The immutable reference record shapes (disease records, pesticide rules)
//! - Error types and result handling
//! - The label normalizer that turns drifting classifier label spellings into
//!   canonical keys

pub mod error;
pub mod label;
pub mod types;

pub use error::{Error, Result};
pub use label::{display_name, is_healthy, normalize, LabelNormalizer, Resolution};
pub use types::{
    round_half_away, Alternative, CanonicalKey, ClassProbability, DiseaseRecord, DosageEstimate,
    DosageReport, HealthAssessment, PesticideRule, PredictionResult, PrimaryDisease, Ranking,
    Severity, Treatment,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::label::{normalize, LabelNormalizer};
    pub use crate::types::{CanonicalKey, ClassProbability, DiseaseRecord, Ranking, Severity};
}
