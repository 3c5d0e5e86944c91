// 🎯 Tier Matchers - Cascading duplicate checks for candidate/existing pairs
// Four levels: Exact Reference, Strong, Likely, Possible

use crate::db::ExistingTransaction;
use crate::extraction::{extract_merchant_name, extract_reference_from_note};
use crate::similarity::similarity_percent;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// MATCH TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    /// Level 1: same amount, same day, same reference number
    Exact,

    /// Level 2: same amount, ±1 day, description similarity > 80%
    Strong,

    /// Level 3: amount within 5%, ±3 days, description similarity > 60%
    Likely,

    /// Level 4: amount within 10%, ±7 days, merchant similarity > 70%
    Possible,
}

impl MatchTier {
    pub fn level(&self) -> u8 {
        match self {
            MatchTier::Exact => 1,
            MatchTier::Strong => 2,
            MatchTier::Likely => 3,
            MatchTier::Possible => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatchTier::Exact => "Exact",
            MatchTier::Strong => "Strong",
            MatchTier::Likely => "Likely",
            MatchTier::Possible => "Possible",
        }
    }

    /// Inclusive confidence band for this tier
    ///
    /// Bands never overlap (the gaps 66-69, 86-89 and 96-98 are unreachable),
    /// so a confidence value alone identifies its tier.
    pub fn confidence_band(&self) -> (u8, u8) {
        match self {
            MatchTier::Exact => (99, 99),
            MatchTier::Strong => (90, 95),
            MatchTier::Likely => (70, 85),
            MatchTier::Possible => (50, 65),
        }
    }
}

// ============================================================================
// CANDIDATE & MATCH TYPES
// ============================================================================

/// Incoming transaction being checked before import
///
/// Never persisted here; the caller decides what to do with flagged rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTransaction {
    pub wallet_id: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    pub currency: String,

    /// Seconds since Unix epoch
    pub date: i64,

    pub description: String,

    /// Explicit reference number from the import, empty when absent.
    /// Distinct from any reference embedded in existing note text.
    #[serde(default)]
    pub reference_number: String,
}

impl CandidateTransaction {
    /// Calendar day of the candidate, bucketed in UTC
    pub fn date_naive(&self) -> NaiveDate {
        DateTime::from_timestamp(self.date, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Index of the candidate in the input batch
    pub candidate_index: usize,

    /// Row id of the matched existing transaction
    pub existing_id: i64,

    /// Confidence score (0-99), always inside the tier's band
    pub confidence: u8,

    /// Which tier detected this match
    pub tier: MatchTier,

    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// TIER PARAMETERS
// ============================================================================

const STRONG_MAX_DAYS: i64 = 1;
const STRONG_MIN_SIMILARITY: f64 = 80.0;

const LIKELY_AMOUNT_TOLERANCE: f64 = 0.05;
const LIKELY_MAX_DAYS: i64 = 3;
const LIKELY_MIN_SIMILARITY: f64 = 60.0;

const POSSIBLE_AMOUNT_TOLERANCE: f64 = 0.10;
const POSSIBLE_MAX_DAYS: i64 = 7;
const POSSIBLE_MIN_MERCHANT_SIMILARITY: f64 = 70.0;

// ============================================================================
// PAIR MATCHING
// ============================================================================

/// Evaluate one candidate against one existing transaction
///
/// Tiers are tried strongest first; the first tier whose criteria hold wins
/// and the rest are never evaluated.
pub fn match_pair(
    candidate_index: usize,
    candidate: &CandidateTransaction,
    existing: &ExistingTransaction,
) -> Option<DuplicateMatch> {
    if let Some(m) = check_exact_reference(candidate_index, candidate, existing) {
        return Some(m);
    }

    if let Some(m) = check_strong(candidate_index, candidate, existing) {
        return Some(m);
    }

    if let Some(m) = check_likely(candidate_index, candidate, existing) {
        return Some(m);
    }

    check_possible(candidate_index, candidate, existing)
}

/// Level 1: Exact Reference
/// Same amount, same day, candidate reference equals the reference embedded
/// in the existing note → confidence 99
fn check_exact_reference(
    candidate_index: usize,
    candidate: &CandidateTransaction,
    existing: &ExistingTransaction,
) -> Option<DuplicateMatch> {
    if candidate.amount != existing.amount {
        return None;
    }

    if candidate.date_naive() != existing.date {
        return None;
    }

    if candidate.reference_number.is_empty() {
        return None;
    }

    // Byte-for-byte comparison, no case folding
    let existing_reference = extract_reference_from_note(&existing.note);
    if existing_reference.is_empty() || existing_reference != candidate.reference_number {
        return None;
    }

    let (confidence, _) = MatchTier::Exact.confidence_band();

    Some(DuplicateMatch {
        candidate_index,
        existing_id: existing.id,
        confidence,
        tier: MatchTier::Exact,
        reason: format!(
            "Exact match: reference number {} | amount {} | {}",
            candidate.reference_number, candidate.amount, existing.date
        ),
    })
}

/// Level 2: Strong
/// Same amount, ±1 day, description similarity > 80% → confidence 90-95
fn check_strong(
    candidate_index: usize,
    candidate: &CandidateTransaction,
    existing: &ExistingTransaction,
) -> Option<DuplicateMatch> {
    if candidate.amount != existing.amount {
        return None;
    }

    let days_diff = days_apart(candidate, existing);
    if days_diff > STRONG_MAX_DAYS {
        return None;
    }

    let sim = similarity_percent(&candidate.description, &existing.note);
    if sim <= STRONG_MIN_SIMILARITY {
        return None;
    }

    // 90 at the threshold, 95 for identical text
    let raw = 90.0 + (sim - STRONG_MIN_SIMILARITY) / 20.0 * 5.0;
    let confidence = clamp_confidence(raw, MatchTier::Strong.confidence_band());

    Some(DuplicateMatch {
        candidate_index,
        existing_id: existing.id,
        confidence,
        tier: MatchTier::Strong,
        reason: format!(
            "Strong match: same amount {} | {} day(s) apart | description similarity {:.1}%",
            candidate.amount, days_diff, sim
        ),
    })
}

/// Level 3: Likely
/// Amount within 5%, ±3 days, description similarity > 60% → confidence 70-85
fn check_likely(
    candidate_index: usize,
    candidate: &CandidateTransaction,
    existing: &ExistingTransaction,
) -> Option<DuplicateMatch> {
    // Relative tolerance is undefined at zero
    if candidate.amount == 0 {
        return None;
    }

    let amount_diff = relative_amount_diff(candidate, existing);
    if amount_diff > LIKELY_AMOUNT_TOLERANCE {
        return None;
    }

    let days_diff = days_apart(candidate, existing);
    if days_diff > LIKELY_MAX_DAYS {
        return None;
    }

    let sim = similarity_percent(&candidate.description, &existing.note);
    if sim <= LIKELY_MIN_SIMILARITY {
        return None;
    }

    // Closer similarity, dates and amounts each push the score up
    let raw = 70.0
        + (sim - LIKELY_MIN_SIMILARITY) / 40.0 * 10.0
        + (LIKELY_MAX_DAYS - days_diff) as f64 / LIKELY_MAX_DAYS as f64 * 3.0
        + (LIKELY_AMOUNT_TOLERANCE - amount_diff) / LIKELY_AMOUNT_TOLERANCE * 2.0;
    let confidence = clamp_confidence(raw, MatchTier::Likely.confidence_band());

    Some(DuplicateMatch {
        candidate_index,
        existing_id: existing.id,
        confidence,
        tier: MatchTier::Likely,
        reason: format!(
            "Likely match: amount within {:.1}% | {} day(s) apart | description similarity {:.1}%",
            amount_diff * 100.0,
            days_diff,
            sim
        ),
    })
}

/// Level 4: Possible
/// Amount within 10%, ±7 days, merchant similarity > 70% → confidence 50-65
fn check_possible(
    candidate_index: usize,
    candidate: &CandidateTransaction,
    existing: &ExistingTransaction,
) -> Option<DuplicateMatch> {
    // Relative tolerance is undefined at zero
    if candidate.amount == 0 {
        return None;
    }

    let amount_diff = relative_amount_diff(candidate, existing);
    if amount_diff > POSSIBLE_AMOUNT_TOLERANCE {
        return None;
    }

    let days_diff = days_apart(candidate, existing);
    if days_diff > POSSIBLE_MAX_DAYS {
        return None;
    }

    let candidate_merchant = extract_merchant_name(&candidate.description);
    let existing_merchant = extract_merchant_name(&existing.note);
    let sim = similarity_percent(&candidate_merchant, &existing_merchant);
    if sim <= POSSIBLE_MIN_MERCHANT_SIMILARITY {
        return None;
    }

    let raw = 50.0
        + (sim - POSSIBLE_MIN_MERCHANT_SIMILARITY) / 30.0 * 10.0
        + (POSSIBLE_MAX_DAYS - days_diff) as f64 / POSSIBLE_MAX_DAYS as f64 * 3.0
        + (POSSIBLE_AMOUNT_TOLERANCE - amount_diff) / POSSIBLE_AMOUNT_TOLERANCE * 2.0;
    let confidence = clamp_confidence(raw, MatchTier::Possible.confidence_band());

    Some(DuplicateMatch {
        candidate_index,
        existing_id: existing.id,
        confidence,
        tier: MatchTier::Possible,
        reason: format!(
            "Possible match: amount within {:.1}% | {} day(s) apart | merchant similarity {:.1}% ({} ≈ {})",
            amount_diff * 100.0,
            days_diff,
            sim,
            candidate_merchant,
            existing_merchant
        ),
    })
}

// ============================================================================
// HELPERS
// ============================================================================

fn days_apart(candidate: &CandidateTransaction, existing: &ExistingTransaction) -> i64 {
    (candidate.date_naive() - existing.date).num_days().abs()
}

/// |amount delta| relative to the candidate amount; caller guards against zero
fn relative_amount_diff(candidate: &CandidateTransaction, existing: &ExistingTransaction) -> f64 {
    (candidate.amount - existing.amount).abs() as f64 / candidate.amount.abs() as f64
}

/// Floor the raw score to a whole confidence and pin it inside the band
fn clamp_confidence(raw: f64, band: (u8, u8)) -> u8 {
    (raw as i64).clamp(band.0 as i64, band.1 as i64) as u8
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(amount: i64, date: &str, description: &str, reference: &str) -> CandidateTransaction {
        CandidateTransaction {
            wallet_id: "w1".to_string(),
            amount,
            currency: "VND".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
                .and_utc()
                .timestamp(),
            description: description.to_string(),
            reference_number: reference.to_string(),
        }
    }

    fn existing(id: i64, amount: i64, date: &str, note: &str) -> ExistingTransaction {
        ExistingTransaction {
            id,
            wallet_id: "w1".to_string(),
            amount,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            note: note.to_string(),
        }
    }

    fn assert_in_band(m: &DuplicateMatch) {
        let (lo, hi) = m.tier.confidence_band();
        assert!(
            m.confidence >= lo && m.confidence <= hi,
            "confidence {} outside band [{}, {}] for tier {}",
            m.confidence,
            lo,
            hi,
            m.tier.name()
        );
    }

    #[test]
    fn test_candidate_date_buckets_in_utc() {
        let mut c = candidate(100, "2024-01-15", "x", "");
        assert_eq!(c.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        // One second before midnight still belongs to the same UTC day
        c.date = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc()
            .timestamp();
        assert_eq!(c.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_exact_reference_match() {
        let c = candidate(100000, "2024-01-15", "Incoming transfer", "FT123456789");
        let e = existing(7, 100000, "2024-01-15", "Bank transfer (Ref: FT123456789)");

        let m = match_pair(0, &c, &e).unwrap();

        assert_eq!(m.tier, MatchTier::Exact);
        assert_eq!(m.confidence, 99);
        assert_eq!(m.existing_id, 7);
        assert!(m.reason.contains("Exact match"));
        assert!(m.reason.contains("FT123456789"));
        assert_in_band(&m);
    }

    #[test]
    fn test_exact_requires_matching_reference() {
        // Amount and day line up, but the reference tokens differ
        let c = candidate(100000, "2024-01-15", "zzz qqq", "FT000");
        let e = existing(7, 100000, "2024-01-15", "Bank transfer (Ref: FT123456789)");

        assert!(match_pair(0, &c, &e).is_none());
    }

    #[test]
    fn test_exact_reference_is_case_sensitive() {
        let c = candidate(100000, "2024-01-15", "Bank transfer", "ft123456789");
        let e = existing(7, 100000, "2024-01-15", "Bank transfer (Ref: FT123456789)");

        // Still matches a weaker tier, but never tier 1
        let m = match_pair(0, &c, &e).unwrap();
        assert_ne!(m.tier, MatchTier::Exact);
        assert_in_band(&m);
    }

    #[test]
    fn test_strong_match_one_day_apart() {
        let c = candidate(100000, "2024-01-15", "PAYMENT TO STARBUCKS #12345", "");
        let e = existing(3, 100000, "2024-01-14", "PAYMENT TO STARBUCKS #12345");

        let m = match_pair(0, &c, &e).unwrap();

        assert_eq!(m.tier, MatchTier::Strong);
        assert_eq!(m.confidence, 95, "identical descriptions score the band top");
        assert!(m.reason.contains("similarity"));
        assert_in_band(&m);
    }

    #[test]
    fn test_strong_requires_similarity_above_80() {
        // Exactly 80% similar: 2 edits over 10 characters
        let c = candidate(5000, "2024-01-15", "abcdefghij", "");
        let e = existing(1, 5000, "2024-01-15", "abcdefghxx");

        let m = match_pair(0, &c, &e).unwrap();

        // Falls past Strong (threshold is strict) into Likely
        assert_eq!(m.tier, MatchTier::Likely);
        assert_eq!(m.confidence, 80);
        assert_in_band(&m);
    }

    #[test]
    fn test_likely_match_close_amount_and_date() {
        let c = candidate(100000, "2024-01-15", "STARBUCKS COFFEE", "");
        let e = existing(9, 103000, "2024-01-13", "STARBUCKS COFFEE SHOP");

        let m = match_pair(0, &c, &e).unwrap();

        assert_eq!(m.tier, MatchTier::Likely);
        assert_eq!(m.confidence, 75);
        assert!(m.reason.contains("day(s) apart"));
        assert_in_band(&m);
    }

    #[test]
    fn test_possible_match_on_merchant() {
        let c = candidate(95000, "2024-01-15", "PAYMENT TO STARBUCKS COFFEE HANOI", "");
        let e = existing(4, 100000, "2024-01-20", "STARBUCKS COFFEE");

        let m = match_pair(0, &c, &e).unwrap();

        assert_eq!(m.tier, MatchTier::Possible);
        assert_eq!(m.confidence, 61);
        assert!(m.reason.contains("merchant similarity"));
        assert_in_band(&m);
    }

    #[test]
    fn test_no_match_amount_too_far() {
        // 15% apart: outside every tier's tolerance
        let c = candidate(100000, "2024-01-15", "STARBUCKS COFFEE", "");
        let e = existing(1, 115000, "2024-01-15", "STARBUCKS COFFEE");

        assert!(match_pair(0, &c, &e).is_none());
    }

    #[test]
    fn test_no_match_dates_too_far() {
        let c = candidate(100000, "2024-01-15", "STARBUCKS COFFEE", "");
        let e = existing(1, 100000, "2024-01-23", "STARBUCKS COFFEE");

        assert!(match_pair(0, &c, &e).is_none());
    }

    #[test]
    fn test_no_match_unrelated_merchants() {
        let c = candidate(100000, "2024-01-15", "PHONE BILL PAYMENT", "");
        let e = existing(1, 100000, "2024-01-15", "STARBUCKS COFFEE");

        assert!(match_pair(0, &c, &e).is_none());
    }

    #[test]
    fn test_zero_amount_skips_relative_tiers() {
        // Two days apart: only tiers 3/4 could fire, and both are guarded
        let c = candidate(0, "2024-01-15", "STARBUCKS COFFEE", "");
        let e = existing(1, 0, "2024-01-17", "STARBUCKS COFFEE");
        assert!(match_pair(0, &c, &e).is_none());

        // Equal zero amounts can still match tier 2 (exact equality, no ratio)
        let same_day = existing(1, 0, "2024-01-15", "STARBUCKS COFFEE");
        let m = match_pair(0, &c, &same_day).unwrap();
        assert_eq!(m.tier, MatchTier::Strong);
    }

    #[test]
    fn test_tier_metadata() {
        assert_eq!(MatchTier::Exact.level(), 1);
        assert_eq!(MatchTier::Strong.level(), 2);
        assert_eq!(MatchTier::Likely.level(), 3);
        assert_eq!(MatchTier::Possible.level(), 4);

        assert_eq!(MatchTier::Exact.confidence_band(), (99, 99));
        assert_eq!(MatchTier::Strong.confidence_band(), (90, 95));
        assert_eq!(MatchTier::Likely.confidence_band(), (70, 85));
        assert_eq!(MatchTier::Possible.confidence_band(), (50, 65));

        assert_eq!(MatchTier::Possible.name(), "Possible");
    }
}
