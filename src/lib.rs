// Import Guard - Core Library
// Duplicate-transaction detection for wallet imports: tiered fuzzy matching
// over a SQLite-backed wallet store. Exposed for the CLI and for embedding.

pub mod db;
pub mod detection;
pub mod extraction;
pub mod import;
pub mod matching;
pub mod similarity;

// Re-export commonly used types
pub use db::{
    find_by_wallet_and_date_range, get_events_for_entity, insert_event, insert_transactions,
    setup_database, verify_count, Event, ExistingTransaction, TransactionRepository,
};
pub use detection::{DetectionSummary, DuplicateDetector, SEARCH_WINDOW_PADDING_DAYS};
pub use extraction::{extract_merchant_name, extract_reference_from_note};
pub use import::{load_candidates, load_existing, read_candidates, read_existing};
pub use matching::{match_pair, CandidateTransaction, DuplicateMatch, MatchTier};
pub use similarity::{edit_distance, normalize, similarity, similarity_percent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
