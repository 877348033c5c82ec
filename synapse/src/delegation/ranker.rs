//! Multi-criteria candidate ranking.
//!
//! Orders capable candidates by a priority-dependent weighted score and
//! keeps the top few. Ranking is deterministic: equal scores preserve input
//! order (first seen wins), so identical inputs always produce identical
//! orderings.

use tracing::debug;

use super::AgentCandidate;
use synapse_core::TaskPriority;

/// Weights for critical and safety-critical tiers.
const CRITICAL_WEIGHTS: RankWeights = RankWeights {
    capability: 0.4,
    reliability: 0.3,
    predicted_performance: 0.2,
    availability: 0.1,
};

/// Weights for all other tiers.
const STANDARD_WEIGHTS: RankWeights = RankWeights {
    capability: 0.3,
    reliability: 0.2,
    predicted_performance: 0.3,
    availability: 0.2,
};

#[derive(Debug, Clone, Copy)]
struct RankWeights {
    capability: f64,
    reliability: f64,
    predicted_performance: f64,
    availability: f64,
}

/// Ranks filtered candidates into an ordered shortlist.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRanker {
    max_candidates: usize,
}

impl CandidateRanker {
    /// Create a ranker retaining at most `max_candidates` entries
    pub fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates: max_candidates.max(1),
        }
    }

    /// Rank candidates for a task priority, best first.
    ///
    /// The sort is stable, which is what makes the tie-break-by-input-order
    /// property hold.
    pub fn rank(
        &self,
        mut candidates: Vec<AgentCandidate>,
        priority: TaskPriority,
    ) -> Vec<AgentCandidate> {
        let weights = if priority.is_critical() {
            CRITICAL_WEIGHTS
        } else {
            STANDARD_WEIGHTS
        };

        for candidate in &mut candidates {
            let availability = candidate.snapshot.availability();
            candidate.rank_score = candidate.match_score * weights.capability
                + candidate.snapshot.agent.reliability * weights.reliability
                + candidate.prediction.predicted_score * weights.predicted_performance
                + availability * weights.availability;
        }

        candidates.sort_by(|a, b| {
            b.rank_score
                .partial_cmp(&a.rank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.max_candidates);

        debug!(
            retained = candidates.len(),
            top_score = candidates.first().map(|c| c.rank_score),
            "Ranking complete"
        );
        candidates
    }
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self::new(5)
    }
}
