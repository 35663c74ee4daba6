//! Core types for CropCheck

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Normalized string identifying a crop + condition pair.
///
/// Many raw label spellings map to one key; equality is exact string
/// equality with no fuzzy matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Wrap an already-canonical string
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CanonicalKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// One entry of the classifier's output distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    /// Index of the class in the model's output vector
    pub class_index: usize,

    /// Class name exactly as the model was trained with it
    pub raw_label: String,

    /// Probability in [0, 1]
    pub probability: f32,
}

impl ClassProbability {
    /// Create a new class probability
    pub fn new(class_index: usize, raw_label: impl Into<String>, probability: f32) -> Self {
        Self {
            class_index,
            raw_label: raw_label.into(),
            probability,
        }
    }

    /// Probability expressed as a percentage, rounded to 2 decimals
    pub fn percent(&self) -> f64 {
        round_half_away(f64::from(self.probability) * 100.0, 2)
    }
}

/// Top-K view over a probability vector, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Ranked entries, non-increasing by probability
    pub entries: Vec<ClassProbability>,

    /// Number of classes the ranking was taken from
    pub total_classes: usize,
}

impl Ranking {
    /// The top-1 prediction, if any class was ranked
    pub fn top(&self) -> Option<&ClassProbability> {
        self.entries.first()
    }

    /// Everything after the top-1 prediction
    pub fn alternatives(&self) -> &[ClassProbability] {
        self.entries.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Health verdict derived from the top-1 prediction only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Whether the top-1 canonical key denotes a healthy plant
    pub healthy: bool,

    /// Top-1 confidence as a percentage
    pub confidence_percent: f64,

    /// 0-100 summary of crop health
    pub health_score_percent: f64,
}

impl HealthAssessment {
    /// Score a top-1 prediction.
    ///
    /// Healthy predictions score their own confidence; diseased ones score
    /// the remainder, so a confident diagnosis of disease reads as poor
    /// health.
    pub fn from_top(healthy: bool, probability: f32) -> Self {
        let confidence = f64::from(probability) * 100.0;
        let score = if healthy { confidence } else { 100.0 - confidence };

        Self {
            healthy,
            confidence_percent: round_half_away(confidence, 2),
            health_score_percent: round_half_away(score, 2),
        }
    }
}

/// Fixed-shape treatment guidance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Treatment {
    /// Chemical controls, in recommended order
    #[serde(default)]
    pub chemical: Vec<String>,

    /// Biological and cultural controls
    #[serde(default)]
    pub biological: Vec<String>,

    /// Preventive measures
    #[serde(default)]
    pub prevention: Vec<String>,
}

impl Treatment {
    /// Whether every category carries at least one entry
    pub fn is_complete(&self) -> bool {
        !self.chemical.is_empty() && !self.biological.is_empty() && !self.prevention.is_empty()
    }
}

/// Descriptive and treatment record for one disease
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    /// Canonical key of the crop + condition
    pub key: CanonicalKey,

    /// Human readable disease name
    #[serde(rename = "name")]
    pub display_name: String,

    /// Scientific name of the pathogen or pest
    #[serde(rename = "scientific", default = "unknown")]
    pub scientific_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub symptoms: String,

    #[serde(default)]
    pub treatment: Treatment,
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// Per-disease pesticide recommendation used by the dosage calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PesticideRule {
    /// Canonical key of the crop + condition
    pub key: CanonicalKey,

    /// Commercial product to apply
    #[serde(rename = "product")]
    pub product_name: String,

    /// Millilitres of product per litre of spray water
    pub dosage_per_litre_ml: f64,

    /// Litres of spray water needed per 1000 square feet
    pub water_per_1000_sqft_litre: f64,

    /// Price of one litre of product
    pub price_per_litre: f64,
}

/// Infestation intensity used to scale the base dosage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Severity {
    /// Parse a caller-supplied severity; anything unrecognized is moderate
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "mild" => Self::Mild,
            "severe" => Self::Severe,
            "moderate" => Self::Moderate,
            other => {
                tracing::debug!(severity = other, "unrecognized severity, using moderate");
                Self::Moderate
            }
        }
    }

    /// Scalar applied to the base pesticide dosage
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Mild => 0.8,
            Self::Moderate => 1.0,
            Self::Severe => 1.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the pesticide dosage calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageEstimate {
    #[serde(rename = "pesticide_name")]
    pub product_name: String,

    #[serde(rename = "total_water_litre")]
    pub total_water_litres: f64,

    pub total_pesticide_ml: f64,

    /// One "bottle" is one litre of product
    pub bottles_needed_litre: f64,

    pub estimated_cost: f64,
}

/// Dosage section attached to a prediction when the caller asked for one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageReport {
    pub disease_key: CanonicalKey,
    pub area_sqft: f64,
    pub severity: Severity,

    /// False when the pesticide table has no rule for the disease
    pub available: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<DosageEstimate>,
}

/// Primary disease section of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryDisease {
    /// Raw class label reported by the model
    pub class: String,
    pub key: CanonicalKey,
    pub name: String,
    pub scientific: String,
    pub description: String,
    pub symptoms: String,
    pub treatment: Treatment,
    pub confidence: f64,
}

/// Lower-ranked alternative prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Raw class label reported by the model
    pub class: String,
    pub key: CanonicalKey,
    pub name: String,
    pub confidence: f64,
}

/// Complete recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub healthy: bool,

    /// Top-1 confidence, percent
    pub confidence: f64,

    #[serde(rename = "healthScore")]
    pub health_score: f64,

    pub primary_disease: PrimaryDisease,

    pub alternatives: Vec<Alternative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<DosageReport>,
}

/// Round `value` to `places` decimals, halves away from zero
pub fn round_half_away(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
