//! Label normalization
//!
//! Classifier training sets name their classes inconsistently
//! (`Apple___Apple_scab`, `Tomato__Target_Spot`, `Pepper,_bell___healthy`,
//! `Corn_(maize)___Common_rust_`). Everything downstream is keyed by a
//! [`CanonicalKey`]: the rule-normalized label, unless the alias table knows
//! a better spelling for it.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::{Error, Result};
use crate::types::CanonicalKey;

/// Rule-based normalization of a raw class label.
///
/// Separator runs (`___`, `__`, or longer) collapse to a single underscore
/// and leading/trailing underscores are stripped. Commas, parentheses,
/// spaces and hyphens are left untouched. Total and idempotent.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch == '_' {
            if previous_underscore {
                continue;
            }
            previous_underscore = true;
        } else {
            previous_underscore = false;
        }
        out.push(ch);
    }

    out.trim_matches('_').to_string()
}

/// Whether a canonical key denotes a healthy plant
pub fn is_healthy(key: &str) -> bool {
    key.to_ascii_lowercase().contains("healthy")
}

/// Human readable "Crop - Condition" form of a raw label or canonical key.
///
/// Raw labels are split on their `___` separator. Canonical keys are split
/// after the crop word, which keeps parenthesised qualifiers
/// (`Corn_(maize)`) and comma continuations (`Pepper,_bell`) with the crop.
/// Labels with no recognizable separator only get underscores turned into
/// spaces.
pub fn display_name(label: &str) -> String {
    match split_crop_condition(label) {
        Some((crop, condition)) => format!("{} - {}", title_case(&crop), title_case(&condition)),
        None => label.replace('_', " "),
    }
}

fn split_crop_condition(label: &str) -> Option<(String, String)> {
    if let Some((crop, condition)) = label.split_once("___") {
        let crop = words(crop);
        let condition = words(condition);
        if !crop.is_empty() && !condition.is_empty() {
            return Some((crop, condition));
        }
    }

    let tokens: Vec<&str> = label.split('_').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut crop_end = 1;
    let mut depth = paren_depth(tokens[0]);
    while crop_end < tokens.len() {
        let last = tokens[crop_end - 1];
        let next = tokens[crop_end];
        if depth > 0 || last.ends_with(',') || next.starts_with('(') {
            depth += paren_depth(next);
            crop_end += 1;
        } else {
            break;
        }
    }

    if crop_end >= tokens.len() {
        return None;
    }

    Some((tokens[..crop_end].join(" "), tokens[crop_end..].join(" ")))
}

fn paren_depth(token: &str) -> i32 {
    token.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

fn words(part: &str) -> String {
    part.split('_')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut done = false;
            word.chars()
                .map(|ch| {
                    if !done && ch.is_alphabetic() {
                        done = true;
                        ch.to_uppercase().next().unwrap_or(ch)
                    } else {
                        ch
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of resolving a raw label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical key to query reference tables with
    pub key: CanonicalKey,

    /// Rule-normalized form of the raw label
    pub normalized: String,

    /// Whether the alias table supplied the key
    pub via_alias: bool,
}

/// Alias-aware label normalizer.
///
/// Holds the explicit alias table (normalized alias spelling → canonical
/// key). Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct LabelNormalizer {
    aliases: HashMap<String, CanonicalKey>,
    targets: HashSet<CanonicalKey>,
}

impl LabelNormalizer {
    /// Create a normalizer with an empty alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a normalizer from `(canonical key, aliases)` groups
    pub fn with_aliases<I, A, S>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CanonicalKey, A)>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalizer = Self::new();
        for (key, aliases) in groups {
            for alias in aliases {
                normalizer.add_alias(alias.as_ref(), &key)?;
            }
        }
        Ok(normalizer)
    }

    /// Register `alias` as another spelling of `key`.
    ///
    /// The alias is stored in normalized form. Fails when the key is not in
    /// normalized form, when the alias already points elsewhere, or when
    /// an alias and a canonical key would collide.
    pub fn add_alias(&mut self, alias: &str, key: &CanonicalKey) -> Result<()> {
        if normalize(key.as_str()) != key.as_str() {
            return Err(Error::config(format!(
                "canonical key '{}' is not in normalized form",
                key
            )));
        }

        let alias = normalize(alias);
        if alias == key.as_str() {
            return Ok(());
        }

        if self.aliases.contains_key(key.as_str()) {
            return Err(Error::config(format!(
                "'{}' is registered as an alias and cannot be a canonical key",
                key
            )));
        }

        if self.targets.contains(alias.as_str()) {
            return Err(Error::config(format!(
                "alias '{}' collides with an existing canonical key",
                alias
            )));
        }

        match self.aliases.get(&alias) {
            Some(existing) if existing != key => Err(Error::config(format!(
                "alias '{}' maps to both '{}' and '{}'",
                alias, existing, key
            ))),
            Some(_) => Ok(()),
            None => {
                self.aliases.insert(alias, key.clone());
                self.targets.insert(key.clone());
                Ok(())
            }
        }
    }

    /// Resolve a raw label to its canonical key.
    ///
    /// The rule-normalized label is looked up in the alias table first and
    /// only used as the key itself when no alias matches. Never fails.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let normalized = normalize(raw);
        let (key, via_alias) = match self.aliases.get(&normalized) {
            Some(key) => (key.clone(), true),
            None => (CanonicalKey::new(normalized.clone()), false),
        };

        trace!(
            stage = "normalize",
            raw_label = raw,
            canonical_key = %key,
            via_alias,
            "resolved label"
        );

        Resolution {
            key,
            normalized,
            via_alias,
        }
    }

    /// Shorthand for `resolve(raw).key`
    pub fn canonical_key(&self, raw: &str) -> CanonicalKey {
        self.resolve(raw).key
    }

    /// All alias spellings registered for `key`
    pub fn aliases_of<'a>(&'a self, key: &'a CanonicalKey) -> impl Iterator<Item = &'a str> + 'a {
        self.aliases
            .iter()
            .filter(move |(_, target)| *target == key)
            .map(|(alias, _)| alias.as_str())
    }

    /// Number of registered aliases
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
