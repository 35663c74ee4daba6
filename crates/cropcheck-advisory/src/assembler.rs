//! Response assembly

use cropcheck_core::{
    Alternative, CanonicalKey, ClassProbability, DiseaseRecord, DosageReport, HealthAssessment,
    PredictionResult, PrimaryDisease,
};
use std::sync::Arc;

/// A ranked prediction after label resolution and record lookup
#[derive(Debug, Clone)]
pub struct ResolvedPrediction {
    pub probability: ClassProbability,
    pub key: CanonicalKey,
    pub record: Arc<DiseaseRecord>,
}

/// Compose the caller-facing result. Pure; every decision has been made.
pub fn assemble(
    primary: &ResolvedPrediction,
    alternatives: &[ResolvedPrediction],
    health: HealthAssessment,
    dosage: Option<DosageReport>,
) -> PredictionResult {
    let record = &primary.record;

    PredictionResult {
        healthy: health.healthy,
        confidence: health.confidence_percent,
        health_score: health.health_score_percent,
        primary_disease: PrimaryDisease {
            class: primary.probability.raw_label.clone(),
            key: primary.key.clone(),
            name: record.display_name.clone(),
            scientific: record.scientific_name.clone(),
            description: record.description.clone(),
            symptoms: record.symptoms.clone(),
            treatment: record.treatment.clone(),
            confidence: primary.probability.percent(),
        },
        alternatives: alternatives
            .iter()
            .map(|alt| Alternative {
                class: alt.probability.raw_label.clone(),
                key: alt.key.clone(),
                name: alt.record.display_name.clone(),
                confidence: alt.probability.percent(),
            })
            .collect(),
        dosage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::fallback_record;
    use cropcheck_core::Severity;

    fn resolved(index: usize, raw: &str, key: &str, probability: f32) -> ResolvedPrediction {
        let key = CanonicalKey::from(key);
        ResolvedPrediction {
            probability: ClassProbability::new(index, raw, probability),
            record: Arc::new(fallback_record(&key)),
            key,
        }
    }

    #[test]
    fn test_assemble_copies_inputs() {
        let primary = resolved(21, "Potato___Late_blight", "Potato_Late_blight", 0.8125);
        let alternatives = vec![
            resolved(20, "Potato___Early_blight", "Potato_Early_blight", 0.125),
            resolved(22, "Potato___healthy", "Potato_healthy", 0.0625),
        ];
        let health = HealthAssessment::from_top(false, 0.8125);

        let result = assemble(&primary, &alternatives, health, None);

        assert!(!result.healthy);
        assert_eq!(result.confidence, 81.25);
        assert_eq!(result.health_score, 18.75);
        assert_eq!(result.primary_disease.class, "Potato___Late_blight");
        assert_eq!(result.primary_disease.key.as_str(), "Potato_Late_blight");
        assert_eq!(result.primary_disease.name, "Potato - Late Blight");
        assert_eq!(result.alternatives.len(), 2);
        assert_eq!(result.alternatives[0].confidence, 12.5);
        assert_eq!(result.alternatives[1].name, "Potato - Healthy");
        assert!(result.dosage.is_none());
    }

    #[test]
    fn test_assemble_passes_dosage_through() {
        let primary = resolved(0, "Rose___Black_spot", "Rose_Black_spot", 1.0);
        let dosage = DosageReport {
            disease_key: primary.key.clone(),
            area_sqft: 500.0,
            severity: Severity::Mild,
            available: false,
            estimate: None,
        };

        let result = assemble(
            &primary,
            &[],
            HealthAssessment::from_top(false, 1.0),
            Some(dosage.clone()),
        );

        assert_eq!(result.dosage, Some(dosage));
        assert!(result.alternatives.is_empty());
        assert_eq!(result.health_score, 0.0);
    }
}
