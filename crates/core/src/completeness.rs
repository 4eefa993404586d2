//! Data completeness scoring.
//!
//! The score is the percentage of a project's competitors that have at
//! least one captured snapshot. It gates AI analysis: below
//! [`MIN_COMPLETENESS_SCORE`] a report is only produced when the caller
//! opts into partial data.

use crate::project::Project;

/// Minimum score at which full analysis proceeds without the fallback flag.
pub const MIN_COMPLETENESS_SCORE: u8 = 50;

/// Score reported for a project without competitors: complete for what's
/// available.
pub const PROJECT_ONLY_SCORE: u8 = 100;

/// Score reported when AI analysis could not be initialized at all.
pub const FALLBACK_OVERVIEW_SCORE: u8 = 0;

/// Compute `100 * ready / total`, rounded down.
///
/// Returns [`PROJECT_ONLY_SCORE`] when `total` is zero. The result is always
/// within `0..=100`, even if `ready` is larger than `total`.
pub fn completeness_score(ready: usize, total: usize) -> u8 {
    if total == 0 {
        return PROJECT_ONLY_SCORE;
    }
    let ready = ready.min(total);
    // ready <= total, so the quotient is at most 100.
    ((ready * 100) / total) as u8
}

/// Score for a whole project.
pub fn project_completeness(project: &Project) -> u8 {
    completeness_score(project.ready_competitor_count(), project.competitors.len())
}

/// Whether `score` clears the bar for full analysis.
pub fn meets_threshold(score: u8) -> bool {
    score >= MIN_COMPLETENESS_SCORE
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_ready_scores_zero() {
        assert_eq!(completeness_score(0, 4), 0);
        assert_eq!(completeness_score(0, 1), 0);
    }

    #[test]
    fn all_ready_scores_hundred() {
        assert_eq!(completeness_score(4, 4), 100);
        assert_eq!(completeness_score(1, 1), 100);
    }

    #[test]
    fn partial_scores_round_down() {
        assert_eq!(completeness_score(1, 4), 25);
        assert_eq!(completeness_score(1, 3), 33);
        assert_eq!(completeness_score(2, 3), 66);
    }

    #[test]
    fn no_competitors_is_complete() {
        assert_eq!(completeness_score(0, 0), 100);
    }

    #[test]
    fn score_stays_in_range() {
        for total in 1..=25 {
            for ready in 0..=total + 3 {
                let score = completeness_score(ready, total);
                assert!(score <= 100, "score {score} for {ready}/{total}");
            }
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(meets_threshold(50));
        assert!(meets_threshold(100));
        assert!(!meets_threshold(49));
        assert!(!meets_threshold(0));
    }
}
