use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Persisted wallet transaction
///
/// Amounts are stored in the smallest currency unit (integer), dates at day
/// precision. The note may carry an embedded reference token ("(Ref: ...)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingTransaction {
    /// Row id, assigned by the store (0 before insert)
    #[serde(default)]
    pub id: i64,

    pub wallet_id: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Calendar date, no time-of-day
    pub date: NaiveDate,

    pub note: String,
}

impl ExistingTransaction {
    /// Compute idempotency hash for insert-time deduplication
    ///
    /// Re-importing the same row is a no-op; the hash is NOT an identity,
    /// just a guard against exact re-inserts.
    pub fn idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.wallet_id, self.amount, self.date, self.note
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// REPOSITORY SEAM
// ============================================================================

/// Store capability the duplicate detector depends on
///
/// Implemented for rusqlite::Connection below; tests substitute stubs.
pub trait TransactionRepository {
    fn find_by_wallet_and_date_range(
        &self,
        wallet_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExistingTransaction>>;
}

impl TransactionRepository for Connection {
    fn find_by_wallet_and_date_range(
        &self,
        wallet_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExistingTransaction>> {
        find_by_wallet_and_date_range(self, wallet_id, start, end)
    }
}

// ============================================================================
// EVENTS (AUDIT TRAIL)
// ============================================================================

/// Event for audit trail: every store mutation and every flagged duplicate
/// leaves one behind
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            wallet_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            note TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // The detector always queries one wallet over a date window
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wallet_date ON transactions(wallet_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WRITES
// ============================================================================

pub fn insert_transactions(conn: &Connection, transactions: &[ExistingTransaction]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for tx in transactions {
        let hash = tx.idempotency_hash();

        let result = conn.execute(
            "INSERT INTO transactions (idempotency_hash, wallet_id, amount, date, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![hash, tx.wallet_id, tx.amount, tx.date.to_string(), tx.note],
        );

        match result {
            Ok(_) => {
                inserted += 1;

                // Log event to audit trail
                let event = Event::new(
                    "transaction_added",
                    "transaction",
                    &hash,
                    serde_json::json!({
                        "wallet_id": tx.wallet_id,
                        "amount": tx.amount,
                        "date": tx.date.to_string(),
                    }),
                    "wallet_importer",
                );
                let _ = insert_event(conn, &event);
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Inserted: {} transactions", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

// ============================================================================
// READS
// ============================================================================

/// Transactions for one wallet with dates in [start, end], both inclusive
pub fn find_by_wallet_and_date_range(
    conn: &Connection,
    wallet_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExistingTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, wallet_id, amount, date, note
         FROM transactions
         WHERE wallet_id = ?1 AND date BETWEEN ?2 AND ?3
         ORDER BY date ASC, id ASC",
    )?;

    let transactions = stmt
        .query_map(
            params![wallet_id, start.to_string(), end.to_string()],
            |row| {
                let date_str: String = row.get(3)?;

                Ok(ExistingTransaction {
                    id: row.get(0)?,
                    wallet_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                    note: row.get(4)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}
