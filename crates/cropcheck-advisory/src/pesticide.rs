//! Pesticide dosage and cost calculator

use cropcheck_core::{
    round_half_away, CanonicalKey, DosageEstimate, Error, LabelNormalizer, PesticideRule, Result,
    Severity,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Area unit the rules' water requirement is expressed per, in sq ft
const RULE_AREA_SQFT: f64 = 1000.0;

/// Millilitres per one-litre bottle of product
const ML_PER_BOTTLE: f64 = 1000.0;

/// Pesticide rules keyed by canonical key and every alias spelling
#[derive(Debug, Clone, Default)]
pub struct PesticideTable {
    rules: HashMap<CanonicalKey, Arc<PesticideRule>>,
    distinct: usize,
}

impl PesticideTable {
    /// Index `rules`, sharing each one with every alias of its key
    pub fn from_rules(
        rules: impl IntoIterator<Item = PesticideRule>,
        normalizer: &LabelNormalizer,
    ) -> Result<Self> {
        let mut index = HashMap::new();
        let mut distinct = 0;

        for rule in rules {
            let resolved = normalizer.resolve(rule.key.as_str());
            if resolved.key != rule.key {
                return Err(Error::config(format!(
                    "pesticide rule '{}' is not keyed canonically (expected '{}')",
                    rule.key, resolved.key
                )));
            }
            validate_rule(&rule)?;
            if index.contains_key(&rule.key) {
                return Err(Error::config(format!("duplicate pesticide rule '{}'", rule.key)));
            }

            let rule = Arc::new(rule);
            for alias in normalizer.aliases_of(&rule.key) {
                index.insert(CanonicalKey::from(alias), Arc::clone(&rule));
            }
            index.insert(rule.key.clone(), rule);
            distinct += 1;
        }

        Ok(Self {
            rules: index,
            distinct,
        })
    }

    /// Parse a YAML list of pesticide rules
    pub fn from_yaml(yaml: &str, normalizer: &LabelNormalizer) -> Result<Self> {
        let rules: Vec<PesticideRule> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid pesticide rules: {}", e)))?;
        Self::from_rules(rules, normalizer)
    }

    /// Rule for `key`, if there is one
    pub fn get(&self, key: &CanonicalKey) -> Option<&PesticideRule> {
        self.rules.get(key).map(|rule| rule.as_ref())
    }

    /// Estimate product, water and cost to treat `area_sqft`.
    ///
    /// The area is validated before the table is consulted, so a bad area
    /// is reported even for diseases without a rule.
    pub fn calculate(
        &self,
        key: &CanonicalKey,
        area_sqft: f64,
        severity: Severity,
    ) -> Result<DosageEstimate> {
        validate_area(area_sqft)?;

        let rule = self.rules.get(key).ok_or_else(|| {
            tracing::debug!(stage = "dosage", canonical_key = %key, "no pesticide rule");
            Error::not_found(key.as_str())
        })?;

        estimate(rule, area_sqft, severity)
    }

    /// Number of distinct rules, not counting alias entries
    pub fn len(&self) -> usize {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }
}

/// Apply one rule to an already validated area.
///
/// Fails with an input error when the area is so large that an amount
/// no longer fits in an `f64`.
pub fn estimate(
    rule: &PesticideRule,
    area_sqft: f64,
    severity: Severity,
) -> Result<DosageEstimate> {
    let total_water = area_sqft / RULE_AREA_SQFT * rule.water_per_1000_sqft_litre;
    let total_pesticide_ml = total_water * rule.dosage_per_litre_ml * severity.multiplier();
    let bottles = total_pesticide_ml / ML_PER_BOTTLE;
    let cost = bottles * rule.price_per_litre;

    let estimate = DosageEstimate {
        product_name: rule.product_name.clone(),
        total_water_litres: round_half_away(total_water, 2),
        total_pesticide_ml: round_half_away(total_pesticide_ml, 2),
        bottles_needed_litre: round_half_away(bottles, 2),
        estimated_cost: round_half_away(cost, 2),
    };

    let amounts = [
        estimate.total_water_litres,
        estimate.total_pesticide_ml,
        estimate.bottles_needed_litre,
        estimate.estimated_cost,
    ];
    if amounts.iter().any(|amount| !amount.is_finite()) {
        return Err(Error::input(format!(
            "area_sqft is too large to estimate, got {}",
            area_sqft
        )));
    }

    Ok(estimate)
}

fn validate_area(area_sqft: f64) -> Result<()> {
    if !area_sqft.is_finite() || area_sqft <= 0.0 {
        return Err(Error::input(format!(
            "area_sqft must be a positive number, got {}",
            area_sqft
        )));
    }
    Ok(())
}

fn validate_rule(rule: &PesticideRule) -> Result<()> {
    let fields = [
        ("dosage_per_litre_ml", rule.dosage_per_litre_ml),
        ("water_per_1000_sqft_litre", rule.water_per_1000_sqft_litre),
        ("price_per_litre", rule.price_per_litre),
    ];

    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::config(format!(
                "pesticide rule '{}' has invalid {}: {}",
                rule.key, name, value
            )));
        }
    }

    if rule.product_name.trim().is_empty() {
        return Err(Error::config(format!(
            "pesticide rule '{}' has no product name",
            rule.key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
- key: Potato_Late_blight
  product: Metalaxyl + Mancozeb 72% WP
  dosage_per_litre_ml: 2.5
  water_per_1000_sqft_litre: 14
  price_per_litre: 750
- key: Tomato_Spider_mites Two-spotted_spider_mite
  product: Abamectin 1.8% EC
  dosage_per_litre_ml: 0.5
  water_per_1000_sqft_litre: 10
  price_per_litre: 1200
"#;

    fn table() -> PesticideTable {
        let normalizer = LabelNormalizer::with_aliases([(
            CanonicalKey::from("Tomato_Spider_mites Two-spotted_spider_mite"),
            vec!["Tomato_Spider_mites_Two_spotted_spider_mite"],
        )])
        .unwrap();
        PesticideTable::from_yaml(RULES, &normalizer).unwrap()
    }

    #[test]
    fn test_potato_late_blight_moderate() {
        let estimate = table()
            .calculate(&CanonicalKey::from("Potato_Late_blight"), 1000.0, Severity::Moderate)
            .unwrap();

        assert_eq!(estimate.product_name, "Metalaxyl + Mancozeb 72% WP");
        assert_eq!(estimate.total_water_litres, 14.0);
        assert_eq!(estimate.total_pesticide_ml, 35.0);
        assert_eq!(estimate.bottles_needed_litre, 0.04);
        // Cost comes from the unrounded 0.035 L, not the rounded bottle count
        assert_eq!(estimate.estimated_cost, 26.25);
    }

    #[test]
    fn test_severity_scales_pesticide_only() {
        let table = table();
        let key = CanonicalKey::from("Potato_Late_blight");
        let mild = table.calculate(&key, 2000.0, Severity::Mild).unwrap();
        let moderate = table.calculate(&key, 2000.0, Severity::Moderate).unwrap();
        let severe = table.calculate(&key, 2000.0, Severity::Severe).unwrap();

        assert_eq!(mild.total_water_litres, moderate.total_water_litres);
        assert_eq!(severe.total_water_litres, moderate.total_water_litres);
        assert!((severe.total_pesticide_ml - moderate.total_pesticide_ml * 1.2).abs() < 1e-9);
        assert!((mild.total_pesticide_ml - moderate.total_pesticide_ml * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_alias_reaches_same_rule() {
        let table = table();
        let canonical = table
            .calculate(
                &CanonicalKey::from("Tomato_Spider_mites Two-spotted_spider_mite"),
                500.0,
                Severity::Severe,
            )
            .unwrap();
        let alias = table
            .calculate(
                &CanonicalKey::from("Tomato_Spider_mites_Two_spotted_spider_mite"),
                500.0,
                Severity::Severe,
            )
            .unwrap();

        assert_eq!(canonical, alias);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_disease_is_not_found() {
        let err = table()
            .calculate(&CanonicalKey::from("Rose_Black_spot"), 1000.0, Severity::Moderate)
            .unwrap_err();
        assert!(err.is_lookup_miss());
    }

    #[test]
    fn test_invalid_area_checked_first() {
        let table = table();
        for area in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = table
                .calculate(&CanonicalKey::from("Rose_Black_spot"), area, Severity::Moderate)
                .unwrap_err();
            assert!(err.is_client_error(), "area {} should be rejected", area);
        }
    }

    #[test]
    fn test_overflowing_area_is_rejected() {
        let table = table();
        let key = CanonicalKey::from("Potato_Late_blight");

        for area in [f64::MAX, 1.7e308] {
            let err = table.calculate(&key, area, Severity::Severe).unwrap_err();
            assert!(err.is_client_error(), "area {} should be rejected", area);
            assert!(err.to_string().contains("too large"));
        }

        // Large but representable areas still produce an estimate
        let estimate = table.calculate(&key, 1e12, Severity::Moderate).unwrap();
        assert_eq!(estimate.total_water_litres, 1.4e10);
        assert!(estimate.estimated_cost.is_finite());
    }

    #[test]
    fn test_tiny_area_rounds_to_zero() {
        let estimate = table()
            .calculate(&CanonicalKey::from("Potato_Late_blight"), 0.001, Severity::Mild)
            .unwrap();
        assert_eq!(estimate.estimated_cost, 0.0);
        assert_eq!(estimate.bottles_needed_litre, 0.0);
    }

    #[test]
    fn test_rejects_bad_rules() {
        let negative = r#"
- key: Potato_Late_blight
  product: Metalaxyl
  dosage_per_litre_ml: -1
  water_per_1000_sqft_litre: 14
  price_per_litre: 750
"#;
        assert!(PesticideTable::from_yaml(negative, &LabelNormalizer::new()).is_err());

        let unnamed = r#"
- key: Potato_Late_blight
  product: "  "
  dosage_per_litre_ml: 1
  water_per_1000_sqft_litre: 14
  price_per_litre: 750
"#;
        assert!(PesticideTable::from_yaml(unnamed, &LabelNormalizer::new()).is_err());
    }
}
