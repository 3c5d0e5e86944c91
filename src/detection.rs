// 🛡️ Duplicate Detector - Batch orchestration against the wallet store
// One store round-trip per batch, then every candidate is scored against
// every existing transaction in the window.

use crate::db::{ExistingTransaction, TransactionRepository};
use crate::matching::{match_pair, CandidateTransaction, DuplicateMatch, MatchTier};
use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Widest tier date tolerance; the search window is padded by this much on
/// both sides so no tier-4 pairing can fall outside the fetched rows
pub const SEARCH_WINDOW_PADDING_DAYS: i64 = 7;

// ============================================================================
// DUPLICATE DETECTOR
// ============================================================================

pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn new() -> Self {
        DuplicateDetector
    }

    /// Check a batch of candidates against one wallet's stored transactions
    ///
    /// Returns at most one match per candidate (its highest-confidence
    /// pairing). Candidates with no match are simply absent from the result.
    /// A store failure aborts the whole batch; there are no partial results.
    pub fn detect_duplicates(
        &self,
        repository: &dyn TransactionRepository,
        wallet_id: &str,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<DuplicateMatch>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut min_date = candidates[0].date_naive();
        let mut max_date = min_date;
        for candidate in &candidates[1..] {
            let date = candidate.date_naive();
            if date < min_date {
                min_date = date;
            }
            if date > max_date {
                max_date = date;
            }
        }

        let search_start = min_date - Duration::days(SEARCH_WINDOW_PADDING_DAYS);
        let search_end = max_date + Duration::days(SEARCH_WINDOW_PADDING_DAYS);

        // Exactly one store call per batch
        let existing =
            repository.find_by_wallet_and_date_range(wallet_id, search_start, search_end)?;

        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(best) = best_match(index, candidate, &existing) {
                matches.push(best);
            }
        }

        Ok(matches)
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest-confidence pairing for one candidate; first seen wins ties
fn best_match(
    index: usize,
    candidate: &CandidateTransaction,
    existing: &[ExistingTransaction],
) -> Option<DuplicateMatch> {
    let mut best: Option<DuplicateMatch> = None;

    for tx in existing {
        if let Some(m) = match_pair(index, candidate, tx) {
            let better = match &best {
                Some(current) => m.confidence > current.confidence,
                None => true,
            };
            if better {
                best = Some(m);
            }
        }
    }

    best
}

// ============================================================================
// DETECTION SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub candidate_count: usize,
    pub match_count: usize,
    pub exact_count: usize,
    pub strong_count: usize,
    pub likely_count: usize,
    pub possible_count: usize,
}

impl DetectionSummary {
    pub fn from_matches(candidate_count: usize, matches: &[DuplicateMatch]) -> Self {
        let mut summary = DetectionSummary {
            candidate_count,
            match_count: matches.len(),
            exact_count: 0,
            strong_count: 0,
            likely_count: 0,
            possible_count: 0,
        };

        for m in matches {
            match m.tier {
                MatchTier::Exact => summary.exact_count += 1,
                MatchTier::Strong => summary.strong_count += 1,
                MatchTier::Likely => summary.likely_count += 1,
                MatchTier::Possible => summary.possible_count += 1,
            }
        }

        summary
    }

    pub fn summary(&self) -> String {
        format!(
            "{} candidates: {} flagged | {} exact, {} strong, {} likely, {} possible | {} clean",
            self.candidate_count,
            self.match_count,
            self.exact_count,
            self.strong_count,
            self.likely_count,
            self.possible_count,
            self.candidate_count - self.match_count
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
