//! Fallback ladders.
//!
//! A ladder is an ordered list of query parameters, strictest first. The
//! query is re-run with the next step only while it keeps coming back empty.
//! Errors are never retried: a ladder masks empty results, not failures.

use crate::Result;

/// A non-empty, monotonically relaxing sequence of thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    steps: Vec<f32>,
}

impl Ladder {
    /// A single-step ladder.
    #[must_use]
    pub fn single(step: f32) -> Self {
        Self { steps: vec![step] }
    }

    /// Detection scores: each fallback is clamped so the ladder never rises.
    ///
    /// `relaxing_scores(0.3, &[0.5, 0.35])` is the single step `[0.3]`.
    #[must_use]
    pub fn relaxing_scores(first: f32, fallbacks: &[f32]) -> Self {
        Self::build(first, fallbacks, f32::min)
    }

    /// Distance ceilings: each fallback is clamped so the ladder never falls.
    #[must_use]
    pub fn relaxing_distances(first: f32, fallbacks: &[f32]) -> Self {
        Self::build(first, fallbacks, f32::max)
    }

    fn build(first: f32, fallbacks: &[f32], clamp: fn(f32, f32) -> f32) -> Self {
        let mut steps = vec![first];
        let mut previous = first;
        for &fallback in fallbacks {
            let step = clamp(previous, fallback);
            if !step.total_cmp(&previous).is_eq() {
                steps.push(step);
                previous = step;
            }
        }
        Self { steps }
    }

    /// The steps, strictest first.
    #[must_use]
    pub fn steps(&self) -> &[f32] {
        &self.steps
    }

    /// Number of steps (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// What a ladder run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderOutcome<T> {
    /// The step whose results were kept.
    pub step: f32,
    /// The results of that step only, never a union across steps.
    pub items: Vec<T>,
    /// How many steps were queried.
    pub attempts: usize,
}

/// Runs `query` for each step until one returns a non-empty result.
///
/// When every step comes back empty the outcome holds the last step with no
/// items.
///
/// # Errors
///
/// Returns the first error `query` returns, without trying further steps.
pub fn first_non_empty<T, F>(ladder: &Ladder, mut query: F) -> Result<LadderOutcome<T>>
where
    F: FnMut(f32) -> Result<Vec<T>>,
{
    let mut outcome = LadderOutcome {
        step: ladder.steps[0],
        items: Vec::new(),
        attempts: 0,
    };

    for (i, &step) in ladder.steps.iter().enumerate() {
        if i > 0 {
            tracing::debug!(previous = outcome.step, step, "Relaxing ladder step");
        }
        outcome.items = query(step)?;
        outcome.step = step;
        outcome.attempts = i + 1;
        if !outcome.items.is_empty() {
            break;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use test_case::test_case;

    #[test_case(0.7, &[0.5, 0.35], &[0.7, 0.5, 0.35]; "default shape")]
    #[test_case(0.8, &[0.5, 0.35], &[0.8, 0.5, 0.35]; "strict first")]
    #[test_case(0.3, &[0.5, 0.35], &[0.3]; "never tightens")]
    #[test_case(0.5, &[0.5, 0.35], &[0.5, 0.35]; "duplicate removed")]
    #[test_case(0.4, &[], &[0.4]; "no fallbacks")]
    fn test_relaxing_scores(first: f32, fallbacks: &[f32], expected: &[f32]) {
        assert_eq!(Ladder::relaxing_scores(first, fallbacks).steps(), expected);
    }

    #[test_case(0.4, &[0.6], &[0.4, 0.6]; "floor above")]
    #[test_case(0.6, &[0.6], &[0.6]; "floor equal")]
    #[test_case(0.7, &[0.6], &[0.7]; "floor below")]
    fn test_relaxing_distances(first: f32, fallbacks: &[f32], expected: &[f32]) {
        assert_eq!(Ladder::relaxing_distances(first, fallbacks).steps(), expected);
    }

    #[test]
    fn test_stops_at_first_non_empty() {
        let ladder = Ladder::relaxing_scores(0.8, &[0.5, 0.35]);
        let mut seen = Vec::new();
        let outcome = first_non_empty(&ladder, |step| {
            seen.push(step);
            Ok(if step < 0.6 { vec![1, 2] } else { Vec::new() })
        })
        .unwrap();

        assert_eq!(seen, vec![0.8, 0.5]);
        assert!((outcome.step - 0.5).abs() < f32::EPSILON);
        assert_eq!(outcome.items, vec![1, 2]);
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn test_exhausted_ladder_keeps_last_step() {
        let ladder = Ladder::relaxing_distances(0.4, &[0.6]);
        let outcome = first_non_empty::<u8, _>(&ladder, |_| Ok(Vec::new())).unwrap();
        assert!((outcome.step - 0.6).abs() < f32::EPSILON);
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn test_errors_are_not_masked() {
        let ladder = Ladder::relaxing_scores(0.8, &[0.5, 0.35]);
        let mut calls = 0;
        let result = first_non_empty::<u8, _>(&ladder, |_| {
            calls += 1;
            Err(Error::operation("detect_faces", "boom"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_later_results_are_not_merged() {
        let ladder = Ladder::relaxing_distances(0.4, &[0.6]);
        let outcome = first_non_empty(&ladder, |step| {
            Ok(if step > 0.5 { vec!["x", "y", "z"] } else { Vec::new() })
        })
        .unwrap();
        assert_eq!(outcome.items, vec!["x", "y", "z"]);
    }
}
