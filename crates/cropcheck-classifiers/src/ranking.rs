//! Top-K ranking and health scoring over classifier output

use cropcheck_core::{
    is_healthy, CanonicalKey, ClassProbability, Error, HealthAssessment, Ranking, Result,
};

/// Number of predictions reported per image (primary + alternatives)
pub const TOP_K: usize = 3;

/// Rank the top [`TOP_K`] classes, best first
pub fn rank<S: AsRef<str>>(probabilities: &[f32], class_names: &[S]) -> Result<Ranking> {
    rank_top_k(probabilities, class_names, TOP_K)
}

/// Rank the top `k` classes by probability.
///
/// Ties resolve to the lowest class index. Returns exactly
/// `min(k, class_names.len())` entries.
pub fn rank_top_k<S: AsRef<str>>(
    probabilities: &[f32],
    class_names: &[S],
    k: usize,
) -> Result<Ranking> {
    if probabilities.len() != class_names.len() {
        return Err(Error::mismatch(
            "rank",
            format!(
                "classifier returned {} probabilities for {} class names",
                probabilities.len(),
                class_names.len()
            ),
        ));
    }

    if let Some(index) = probabilities.iter().position(|p| !p.is_finite()) {
        return Err(Error::mismatch(
            "rank",
            format!(
                "probability for class {} ('{}') is {}",
                index,
                class_names[index].as_ref(),
                probabilities[index]
            ),
        ));
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[b]
            .total_cmp(&probabilities[a])
            .then_with(|| a.cmp(&b))
    });

    let entries = order
        .into_iter()
        .take(k)
        .map(|index| {
            ClassProbability::new(index, class_names[index].as_ref(), probabilities[index])
        })
        .collect();

    Ok(Ranking {
        entries,
        total_classes: probabilities.len(),
    })
}

/// Score plant health from the top-1 prediction only
pub fn assess_health(key: &CanonicalKey, top1_probability: f32) -> HealthAssessment {
    HealthAssessment::from_top(is_healthy(key.as_str()), top1_probability)
}
