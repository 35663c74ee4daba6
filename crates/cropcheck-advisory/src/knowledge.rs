//! Disease knowledge base

use cropcheck_core::{
    display_name, is_healthy, CanonicalKey, DiseaseRecord, Error, LabelNormalizer, Result,
    Treatment,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Curated disease records keyed by canonical key and every alias spelling
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: HashMap<CanonicalKey, Arc<DiseaseRecord>>,
    curated: usize,
}

impl KnowledgeBase {
    /// Index `records`, sharing each one with every alias of its key.
    ///
    /// Record keys must already be canonical under `normalizer`, and each
    /// key may appear only once.
    pub fn from_records(
        records: impl IntoIterator<Item = DiseaseRecord>,
        normalizer: &LabelNormalizer,
    ) -> Result<Self> {
        let mut index = HashMap::new();
        let mut curated = 0;

        for record in records {
            let resolved = normalizer.resolve(record.key.as_str());
            if resolved.key != record.key {
                return Err(Error::config(format!(
                    "disease record '{}' is not keyed canonically (expected '{}')",
                    record.key, resolved.key
                )));
            }
            if record.display_name.trim().is_empty() {
                return Err(Error::config(format!(
                    "disease record '{}' has an empty name",
                    record.key
                )));
            }
            if index.contains_key(&record.key) {
                return Err(Error::config(format!(
                    "duplicate disease record '{}'",
                    record.key
                )));
            }

            let record = Arc::new(record);
            for alias in normalizer.aliases_of(&record.key) {
                index.insert(CanonicalKey::from(alias), Arc::clone(&record));
            }
            index.insert(record.key.clone(), record);
            curated += 1;
        }

        Ok(Self {
            records: index,
            curated,
        })
    }

    /// Parse a YAML list of disease records
    pub fn from_yaml(yaml: &str, normalizer: &LabelNormalizer) -> Result<Self> {
        let records: Vec<DiseaseRecord> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid disease records: {}", e)))?;
        Self::from_records(records, normalizer)
    }

    /// Record for `key`, synthesizing a generic one for unknown keys
    pub fn lookup(&self, key: &CanonicalKey) -> Arc<DiseaseRecord> {
        match self.records.get(key) {
            Some(record) => Arc::clone(record),
            None => {
                tracing::debug!(
                    stage = "knowledge",
                    canonical_key = %key,
                    "no curated record, using fallback"
                );
                metrics::counter!("cropcheck_knowledge_fallbacks_total").increment(1);
                Arc::new(fallback_record(key))
            }
        }
    }

    /// Curated record for `key`, if there is one
    pub fn get(&self, key: &CanonicalKey) -> Option<Arc<DiseaseRecord>> {
        self.records.get(key).cloned()
    }

    /// Whether a curated record exists for `key`
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.records.contains_key(key)
    }

    /// Number of curated records, not counting alias entries
    pub fn len(&self) -> usize {
        self.curated
    }

    pub fn is_empty(&self) -> bool {
        self.curated == 0
    }
}

/// Generic record for a key with no curated data
pub fn fallback_record(key: &CanonicalKey) -> DiseaseRecord {
    let name = match display_name(key.as_str()) {
        name if name.trim().is_empty() => "Unknown".to_string(),
        name => name,
    };

    if is_healthy(key.as_str()) {
        return DiseaseRecord {
            key: key.clone(),
            display_name: name,
            scientific_name: "Unknown".to_string(),
            description: "No disease detected. The plant appears healthy.".to_string(),
            symptoms: "No visible symptoms".to_string(),
            treatment: Treatment {
                chemical: vec!["No treatment needed".to_string()],
                biological: vec!["Continue regular care".to_string()],
                prevention: vec![
                    "Regular monitoring".to_string(),
                    "Proper plant spacing".to_string(),
                    "Good sanitation".to_string(),
                ],
            },
        };
    }

    DiseaseRecord {
        key: key.clone(),
        display_name: name,
        scientific_name: "Unknown".to_string(),
        description: "Disease detected. Please consult an agricultural expert for proper treatment."
            .to_string(),
        symptoms: "Visual symptoms detected in the image".to_string(),
        treatment: Treatment {
            chemical: vec!["Consult an agricultural expert for appropriate pesticides".to_string()],
            biological: vec![
                "Remove affected plant parts".to_string(),
                "Improve growing conditions".to_string(),
            ],
            prevention: vec![
                "Regular monitoring".to_string(),
                "Proper plant spacing".to_string(),
                "Good sanitation".to_string(),
            ],
        },
    }
}
