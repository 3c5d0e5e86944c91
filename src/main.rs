use anyhow::Result;
use rusqlite::Connection;
use std::env;
use std::path::Path;

use import_guard::{
    insert_event, insert_transactions, load_candidates, load_existing, setup_database,
    verify_count, DetectionSummary, DuplicateDetector, Event,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() == 4 && args[1] == "import" {
        run_import(Path::new(&args[2]), Path::new(&args[3]))?;
    } else if args.len() == 5 && args[1] == "scan" {
        run_scan(Path::new(&args[2]), &args[3], Path::new(&args[4]))?;
    } else {
        print_usage();
    }

    Ok(())
}

fn run_import(db_path: &Path, csv_path: &Path) -> Result<()> {
    println!("🗄️  Wallet Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading transactions...");
    let transactions = load_existing(csv_path)?;
    println!("✓ Loaded {} transactions from CSV", transactions.len());

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Insert transactions (re-imports are skipped by hash)
    println!("\n💾 Inserting transactions...");
    insert_transactions(&conn, &transactions)?;

    // 4. Verify count
    println!("\n🔍 Verifying database...");
    let count = verify_count(&conn)?;
    println!("✓ Database contains {} transactions", count);

    Ok(())
}

fn run_scan(db_path: &Path, wallet_id: &str, csv_path: &Path) -> Result<()> {
    println!("🛡️  Duplicate Scan - wallet {}", wallet_id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load candidate batch
    println!("\n📂 Loading candidates...");
    let candidates = load_candidates(csv_path)?;
    println!("✓ Loaded {} candidates from CSV", candidates.len());

    // 2. Open wallet store
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;

    // 3. Run detection
    println!("\n🔍 Scanning for duplicates...");
    let detector = DuplicateDetector::new();
    let matches = detector.detect_duplicates(&conn, wallet_id, &candidates)?;

    if matches.is_empty() {
        println!("✓ No duplicates found");
    }

    for m in &matches {
        let candidate = &candidates[m.candidate_index];

        println!(
            "\n⚠️  Candidate #{}: \"{}\"",
            m.candidate_index, candidate.description
        );
        println!(
            "   Tier {} ({}) | confidence {} | existing row {}",
            m.tier.level(),
            m.tier.name(),
            m.confidence,
            m.existing_id
        );
        println!("   {}", m.reason);

        // 4. Every flagged duplicate leaves an audit event
        let event = Event::new(
            "duplicate_flagged",
            "transaction",
            &m.existing_id.to_string(),
            serde_json::json!({
                "wallet_id": wallet_id,
                "candidate_index": m.candidate_index,
                "tier": m.tier.name(),
                "confidence": m.confidence,
                "reason": m.reason,
            }),
            "duplicate_scan",
        );
        insert_event(&conn, &event)?;
    }

    // 5. Per-tier roll-up
    let summary = DetectionSummary::from_matches(candidates.len(), &matches);
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 {}", summary.summary());

    Ok(())
}

fn print_usage() {
    println!("import-guard - duplicate detection for wallet transaction imports");
    println!();
    println!("Usage:");
    println!("  import-guard import <db> <transactions.csv>");
    println!("  import-guard scan <db> <wallet_id> <candidates.csv>");
}
