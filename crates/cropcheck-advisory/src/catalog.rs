//! Reference-data bundle and the advisory façade

use crate::assembler::{assemble, ResolvedPrediction};
use crate::knowledge::KnowledgeBase;
use crate::pesticide::PesticideTable;
use cropcheck_core::{
    is_healthy, CanonicalKey, ClassProbability, DiseaseRecord, DosageReport, Error,
    HealthAssessment, LabelNormalizer, PredictionResult, Ranking, Result, Severity,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const EMBEDDED_ALIASES: &str = include_str!("../data/aliases.yaml");
const EMBEDDED_DISEASES: &str = include_str!("../data/diseases.yaml");
const EMBEDDED_PESTICIDES: &str = include_str!("../data/pesticides.yaml");

/// Optional replacements for the embedded reference data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPaths {
    /// Alias table: canonical key → list of alternative spellings
    #[serde(default)]
    pub aliases: Option<PathBuf>,

    /// List of curated disease records
    #[serde(default)]
    pub diseases: Option<PathBuf>,

    /// List of pesticide rules
    #[serde(default)]
    pub pesticides: Option<PathBuf>,
}

/// Alias table plus both reference tables, built once at startup
#[derive(Debug, Clone)]
pub struct Catalog {
    normalizer: LabelNormalizer,
    knowledge: KnowledgeBase,
    pesticides: PesticideTable,
}

impl Catalog {
    pub fn new(
        normalizer: LabelNormalizer,
        knowledge: KnowledgeBase,
        pesticides: PesticideTable,
    ) -> Self {
        Self {
            normalizer,
            knowledge,
            pesticides,
        }
    }

    /// Reference data compiled into the crate
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_ALIASES, EMBEDDED_DISEASES, EMBEDDED_PESTICIDES)
    }

    /// Embedded data, with any file in `paths` taking its place
    pub fn load(paths: &CatalogPaths) -> Result<Self> {
        let aliases = read_or_embedded(paths.aliases.as_deref(), EMBEDDED_ALIASES)?;
        let diseases = read_or_embedded(paths.diseases.as_deref(), EMBEDDED_DISEASES)?;
        let pesticides = read_or_embedded(paths.pesticides.as_deref(), EMBEDDED_PESTICIDES)?;

        Self::from_yaml(&aliases, &diseases, &pesticides)
    }

    /// Build from YAML documents
    pub fn from_yaml(aliases: &str, diseases: &str, pesticides: &str) -> Result<Self> {
        let groups: BTreeMap<CanonicalKey, Vec<String>> = serde_yaml::from_str(aliases)
            .map_err(|e| Error::config(format!("Invalid alias table: {}", e)))?;
        let normalizer = LabelNormalizer::with_aliases(groups)?;

        let knowledge = KnowledgeBase::from_yaml(diseases, &normalizer)?;
        let pesticides = PesticideTable::from_yaml(pesticides, &normalizer)?;

        info!(
            aliases = normalizer.alias_count(),
            diseases = knowledge.len(),
            pesticide_rules = pesticides.len(),
            "reference data loaded"
        );

        Ok(Self::new(normalizer, knowledge, pesticides))
    }

    pub fn normalizer(&self) -> &LabelNormalizer {
        &self.normalizer
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn pesticides(&self) -> &PesticideTable {
        &self.pesticides
    }
}

fn read_or_embedded(path: Option<&Path>, embedded: &'static str) -> Result<Cow<'static, str>> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e))),
        None => Ok(Cow::Borrowed(embedded)),
    }
}

/// Area and severity for an optional dosage estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosageRequest {
    pub area_sqft: f64,
    pub severity: Severity,
}

/// Knowledge-base answer for an arbitrary label
#[derive(Debug, Clone)]
pub struct DiseaseView {
    pub key: CanonicalKey,
    pub record: Arc<DiseaseRecord>,

    /// False when the record is a synthesized fallback
    pub curated: bool,
}

/// Runs label resolution, lookup, health scoring and dosage for a ranking
#[derive(Debug, Clone)]
pub struct Advisor {
    catalog: Arc<Catalog>,
}

impl Advisor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build the full recommendation for a ranking.
    ///
    /// A dosage request attaches an estimate for the primary disease; a
    /// disease without a pesticide rule yields an unavailable dosage rather
    /// than an error. An invalid area is an error.
    pub fn advise(
        &self,
        ranking: &Ranking,
        dosage: Option<DosageRequest>,
    ) -> Result<PredictionResult> {
        let resolved: Vec<ResolvedPrediction> = ranking
            .entries
            .iter()
            .map(|p| self.resolve_prediction(p))
            .collect();

        let (primary, alternatives) = resolved
            .split_first()
            .ok_or_else(|| Error::mismatch("assemble", "ranking has no entries"))?;

        let health = HealthAssessment::from_top(
            is_healthy(primary.key.as_str()),
            primary.probability.probability,
        );

        let dosage = match dosage {
            Some(request) => Some(self.dosage_for_key(
                primary.key.clone(),
                request.area_sqft,
                request.severity,
            )?),
            None => None,
        };

        info!(
            stage = "advise",
            raw_label = %primary.probability.raw_label,
            canonical_key = %primary.key,
            confidence = health.confidence_percent,
            healthy = health.healthy,
            "prediction assembled"
        );

        Ok(assemble(primary, alternatives, health, dosage))
    }

    /// Dosage for any label, resolved through the alias table
    pub fn dosage(
        &self,
        raw_label: &str,
        area_sqft: f64,
        severity: Severity,
    ) -> Result<DosageReport> {
        let key = self.catalog.normalizer.canonical_key(raw_label);
        self.dosage_for_key(key, area_sqft, severity)
    }

    /// Knowledge-base record for any label, resolved through the alias table
    pub fn describe(&self, raw_label: &str) -> DiseaseView {
        let key = self.catalog.normalizer.canonical_key(raw_label);
        let curated = self.catalog.knowledge.contains(&key);
        let record = self.catalog.knowledge.lookup(&key);

        DiseaseView {
            key,
            record,
            curated,
        }
    }

    fn resolve_prediction(&self, probability: &ClassProbability) -> ResolvedPrediction {
        let resolution = self.catalog.normalizer.resolve(&probability.raw_label);
        let record = self.catalog.knowledge.lookup(&resolution.key);

        debug!(
            stage = "resolve",
            raw_label = %probability.raw_label,
            canonical_key = %resolution.key,
            via_alias = resolution.via_alias,
            "ranked label resolved"
        );

        ResolvedPrediction {
            probability: probability.clone(),
            key: resolution.key,
            record,
        }
    }

    fn dosage_for_key(
        &self,
        key: CanonicalKey,
        area_sqft: f64,
        severity: Severity,
    ) -> Result<DosageReport> {
        let estimate = match self.catalog.pesticides.calculate(&key, area_sqft, severity) {
            Ok(estimate) => Some(estimate),
            Err(e) if e.is_lookup_miss() => None,
            Err(e) => return Err(e),
        };

        Ok(DosageReport {
            available: estimate.is_some(),
            disease_key: key,
            area_sqft,
            severity,
            estimate,
        })
    }
}
