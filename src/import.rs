// 📥 CSV Intake - Candidate batches and wallet seed rows
// Reads the engine's own record shapes. Decoding bank statement layouts
// happens upstream; by the time rows land here they are already normalized.

use crate::db::ExistingTransaction;
use crate::matching::CandidateTransaction;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read candidate rows: wallet_id, amount, currency, date (unix seconds),
/// description, reference_number (optional column, empty when absent)
pub fn read_candidates<R: Read>(reader: R) -> Result<Vec<CandidateTransaction>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let mut candidates = Vec::new();
    for result in rdr.deserialize() {
        let candidate: CandidateTransaction =
            result.context("Failed to deserialize candidate row")?;
        candidates.push(candidate);
    }

    Ok(candidates)
}

pub fn load_candidates(path: &Path) -> Result<Vec<CandidateTransaction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open candidates CSV: {}", path.display()))?;
    read_candidates(file)
}

/// Read wallet seed rows: wallet_id, amount, date (YYYY-MM-DD), note
pub fn read_existing<R: Read>(reader: R) -> Result<Vec<ExistingTransaction>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let mut transactions = Vec::new();
    for result in rdr.deserialize() {
        let transaction: ExistingTransaction =
            result.context("Failed to deserialize transaction row")?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

pub fn load_existing(path: &Path) -> Result<Vec<ExistingTransaction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open transactions CSV: {}", path.display()))?;
    read_existing(file)
}

// ============================================================================
// TESTS
// ============================================================================
