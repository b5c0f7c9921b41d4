use serde::Serialize;

use super::{ModelMetadata, ProblemType, RawScores, ScoreScale};

pub const MULTI_LABEL_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionMode {
    /// Independent sigmoid per class, keep everything at or above the threshold.
    MultiOutput,
    /// Softmax across classes, keep the arg-max.
    SingleOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub mode: DecisionMode,
    /// Chosen class indices, highest probability first (ties → lower index).
    pub indices: Vec<usize>,
    /// Activated score per class index.
    pub probabilities: Vec<f32>,
    /// True when no class cleared the threshold and the arg-max was taken.
    pub fell_back: bool,
}

impl Decision {
    pub fn top_index(&self) -> Option<usize> {
        self.indices.first().copied()
    }
}

/// Multi-output unless the model is declared single-label or has one class.
///
/// A model with several classes and no declaration is treated as multi-label;
/// single-label multi-class models must say so explicitly.
pub fn select_mode(class_count: usize, problem_type: Option<ProblemType>) -> DecisionMode {
    match problem_type {
        Some(ProblemType::MultiLabel) => DecisionMode::MultiOutput,
        Some(ProblemType::SingleLabel) => DecisionMode::SingleOutput,
        None if class_count > 1 => DecisionMode::MultiOutput,
        None => DecisionMode::SingleOutput,
    }
}

pub fn decide(scores: &RawScores, metadata: &ModelMetadata) -> Decision {
    let class_count = if metadata.class_count == 0 {
        scores.values.len()
    } else {
        metadata.class_count
    };
    let mode = select_mode(class_count, metadata.problem_type);
    apply_mode(mode, scores)
}

pub fn apply_mode(mode: DecisionMode, scores: &RawScores) -> Decision {
    let probabilities = match (mode, scores.scale) {
        (_, ScoreScale::Probabilities) => scores.values.clone(),
        (DecisionMode::MultiOutput, ScoreScale::Logits) => {
            scores.values.iter().copied().map(sigmoid).collect()
        }
        (DecisionMode::SingleOutput, ScoreScale::Logits) => softmax(&scores.values),
    };

    let mut fell_back = false;
    let mut indices = match mode {
        DecisionMode::MultiOutput => {
            let cleared: Vec<usize> = probabilities
                .iter()
                .enumerate()
                .filter(|(_, p)| **p >= MULTI_LABEL_THRESHOLD)
                .map(|(idx, _)| idx)
                .collect();
            if cleared.is_empty() {
                fell_back = true;
                argmax(&probabilities).into_iter().collect()
            } else {
                cleared
            }
        }
        DecisionMode::SingleOutput => argmax(&probabilities).into_iter().collect(),
    };

    // stable sort keeps index order among equal scores
    indices.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Decision {
        mode,
        indices,
        probabilities,
        fell_back,
    }
}

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Max-subtracted softmax. Degenerate input (non-finite sums) collapses to a
/// one-hot distribution on the arg-max.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits
        .iter()
        .map(|&x| if x.is_nan() { 0.0 } else { (x - max).exp() })
        .collect();
    let sum: f32 = exps.iter().sum();

    if !sum.is_finite() || sum <= 0.0 {
        let mut one_hot = vec![0.0; logits.len()];
        if let Some(idx) = argmax(logits) {
            one_hot[idx] = 1.0;
        }
        return one_hot;
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; ties resolve to the lowest index and NaN never
/// wins unless every value is NaN.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
        .or(if values.is_empty() { None } else { Some(0) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(class_count: usize, problem_type: Option<ProblemType>) -> ModelMetadata {
        ModelMetadata {
            class_count,
            problem_type,
            ..Default::default()
        }
    }

    #[test]
    fn mode_selection_follows_declaration_then_class_count() {
        assert_eq!(
            select_mode(1, Some(ProblemType::MultiLabel)),
            DecisionMode::MultiOutput
        );
        assert_eq!(
            select_mode(28, Some(ProblemType::SingleLabel)),
            DecisionMode::SingleOutput
        );
        assert_eq!(select_mode(28, None), DecisionMode::MultiOutput);
        assert_eq!(select_mode(1, None), DecisionMode::SingleOutput);
    }

    #[test]
    fn multi_output_keeps_every_class_over_threshold() {
        let scores = RawScores::logits(vec![-3.0, 2.0, -1.0, 0.5]);
        let decision = decide(&scores, &metadata(4, None));
        assert_eq!(decision.mode, DecisionMode::MultiOutput);
        assert_eq!(decision.indices, vec![1, 3]);
        assert!(!decision.fell_back);
    }

    #[test]
    fn multi_output_threshold_is_inclusive() {
        // sigmoid(0) == 0.5
        let scores = RawScores::logits(vec![-1.0, 0.0, -2.0]);
        let decision = decide(&scores, &metadata(3, None));
        assert_eq!(decision.indices, vec![1]);
        assert!(!decision.fell_back);
    }

    #[test]
    fn multi_output_falls_back_to_argmax() {
        let scores = RawScores::logits(vec![-4.0, -0.3, -2.5, -0.3]);
        let decision = decide(&scores, &metadata(4, Some(ProblemType::MultiLabel)));
        assert_eq!(decision.indices, vec![1]);
        assert!(decision.fell_back);
    }

    #[test]
    fn multi_output_orders_by_score() {
        let scores = RawScores::logits(vec![1.0, 3.0, 1.0, -2.0]);
        let decision = decide(&scores, &metadata(4, None));
        assert_eq!(decision.indices, vec![1, 0, 2]);
    }

    #[test]
    fn single_output_picks_global_argmax_with_low_index_ties() {
        let scores = RawScores::logits(vec![0.1, 2.0, 2.0, -1.0]);
        let decision = decide(&scores, &metadata(4, Some(ProblemType::SingleLabel)));
        assert_eq!(decision.mode, DecisionMode::SingleOutput);
        assert_eq!(decision.indices, vec![1]);
    }

    #[test]
    fn single_class_model_is_single_output() {
        let decision = decide(&RawScores::logits(vec![-7.0]), &metadata(1, None));
        assert_eq!(decision.mode, DecisionMode::SingleOutput);
        assert_eq!(decision.indices, vec![0]);
        assert!((decision.probabilities[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_class_count_uses_score_length() {
        let decision = decide(&RawScores::logits(vec![0.2, 0.4]), &metadata(0, None));
        assert_eq!(decision.mode, DecisionMode::MultiOutput);
    }

    #[test]
    fn probability_scores_skip_activation() {
        let mut values = vec![0.05; 28];
        values[0] = 0.2;
        values[1] = 0.9;
        values[2] = 0.1;
        let decision = decide(
            &RawScores::probabilities(values),
            &metadata(28, Some(ProblemType::MultiLabel)),
        );
        assert_eq!(decision.indices, vec![1]);
        assert_eq!(decision.probabilities[1], 0.9);
    }

    #[test]
    fn all_low_probabilities_never_select_nothing() {
        let values = vec![0.1, 0.3, 0.2];
        let decision = decide(&RawScores::probabilities(values), &metadata(3, None));
        assert_eq!(decision.indices, vec![1]);
        assert!(decision.fell_back);
    }

    #[test]
    fn empty_scores_select_nothing() {
        let decision = decide(&RawScores::logits(Vec::new()), &metadata(0, None));
        assert!(decision.indices.is_empty());
        assert_eq!(decision.top_index(), None);
    }

    #[test]
    fn sigmoid_is_bounded_and_monotonic() {
        let xs = [-20.0f32, -3.0, -0.5, 0.0, 0.5, 3.0, 15.0];
        let ys: Vec<f32> = xs.iter().map(|&x| sigmoid(x)).collect();
        assert!(ys.iter().all(|&y| y > 0.0 && y < 1.0));
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn softmax_sums_to_one_and_survives_large_logits() {
        let probs = softmax(&[1000.0, 1001.0, 999.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert_eq!(argmax(&probs), Some(1));
    }

    #[test]
    fn softmax_of_infinite_logit_is_one_hot() {
        let probs = softmax(&[0.0, f32::INFINITY, 1.0]);
        assert_eq!(probs, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn argmax_ignores_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
