//! Scheduling-state persistence and session queries.
//!
//! # Responsibility
//! - Own the `deck_cards` state records: registration, removal, per-heap
//!   session queries, and the atomic batch update used by heap moves.
//! - Provide the ownership/configuration reads the move command consumes.
//!
//! # Invariants
//! - `save_batch` updates all records inside one immediate transaction; a
//!   missing record rolls the whole batch back.
//! - Session queries order by `last_review_at ASC, card_uuid ASC` so equal
//!   review times break ties deterministically across calls.
//! - Records are validated both before writes and after reads; corrupt rows
//!   surface as errors instead of being masked.

use crate::heaping::HeapingAlgorithmId;
use crate::model::scheduling::{CardId, CardScheduling, DeckId, TagId, UserId, UNKNOWN_HEAP};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const SCHEDULING_SELECT_SQL: &str = "SELECT
    deck_uuid,
    card_uuid,
    current_heap,
    last_review_at,
    expiry_at,
    biggest_heap_reached,
    times_in_unknown_heap
FROM deck_cards";

/// Ownership and configuration header of one deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckHeader {
    pub deck_id: DeckId,
    pub owner_id: UserId,
    pub heaping_algorithm_id: HeapingAlgorithmId,
}

/// Query options for one deck heap.
#[derive(Debug, Clone, Default)]
pub struct HeapListQuery {
    pub deck_id: DeckId,
    pub heap: u8,
    /// Card ids to leave out (already in the session, buried, ...).
    pub excluded_card_ids: Vec<CardId>,
    /// Cards carrying any of these tags are left out.
    pub excluded_tag_ids: Vec<TagId>,
}

/// Query options for the unknown-heap candidate pool.
#[derive(Debug, Clone, Default)]
pub struct UnseenListQuery {
    pub deck_id: DeckId,
    pub excluded_card_ids: Vec<CardId>,
    pub excluded_tag_ids: Vec<TagId>,
    /// Oversample cap: only the `pool_limit` oldest candidates are returned.
    pub pool_limit: u32,
}

/// Repository interface for scheduling state.
pub trait SchedulingRepository {
    /// Returns deck ownership and algorithm configuration.
    fn deck_header(&self, deck_id: DeckId) -> RepoResult<Option<DeckHeader>>;
    /// Returns whether the learner account exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
    /// Creates the scheduling record for a card entering a deck.
    fn register_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        added_epoch_ms: i64,
    ) -> RepoResult<()>;
    /// Drops the scheduling record of a card leaving a deck.
    fn remove_card(&self, deck_id: DeckId, card_id: CardId) -> RepoResult<()>;
    /// Gets one scheduling record.
    fn get_scheduling(&self, deck_id: DeckId, card_id: CardId)
        -> RepoResult<Option<CardScheduling>>;
    /// Lists one deck heap with exclusions, oldest review first.
    fn list_heap(&self, query: &HeapListQuery) -> RepoResult<Vec<CardScheduling>>;
    /// Lists the oldest unknown-heap candidates with exclusions.
    fn list_unseen(&self, query: &UnseenListQuery) -> RepoResult<Vec<CardScheduling>>;
    /// Persists a batch of updated records in one transaction.
    fn save_batch(&mut self, records: &[CardScheduling]) -> RepoResult<()>;
}

/// SQLite-backed scheduling repository.
pub struct SqliteSchedulingRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSchedulingRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl SchedulingRepository for SqliteSchedulingRepository<'_> {
    fn deck_header(&self, deck_id: DeckId) -> RepoResult<Option<DeckHeader>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, owner_uuid, heaping_algorithm_id
             FROM decks
             WHERE uuid = ?1;",
        )?;

        let mut rows = stmt.query([deck_id.to_string()])?;
        if let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let owner_text: String = row.get("owner_uuid")?;
            return Ok(Some(DeckHeader {
                deck_id: parse_uuid(&uuid_text, "decks.uuid")?,
                owner_id: parse_uuid(&owner_text, "decks.owner_uuid")?,
                heaping_algorithm_id: row.get("heaping_algorithm_id")?,
            }));
        }
        Ok(None)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn register_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        added_epoch_ms: i64,
    ) -> RepoResult<()> {
        if self.deck_header(deck_id)?.is_none() {
            return Err(RepoError::DeckNotFound(deck_id));
        }
        if self.get_scheduling(deck_id, card_id)?.is_some() {
            return Err(RepoError::AlreadyRegistered { deck_id, card_id });
        }

        let record = CardScheduling::new_unseen(deck_id, card_id, added_epoch_ms);
        self.conn.execute(
            "INSERT INTO deck_cards (
                deck_uuid,
                card_uuid,
                current_heap,
                last_review_at,
                expiry_at,
                biggest_heap_reached,
                times_in_unknown_heap
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.deck_id.to_string(),
                record.card_id.to_string(),
                record.current_heap,
                record.last_review_epoch_ms,
                record.expiry_epoch_ms,
                record.biggest_heap_reached,
                record.times_in_unknown_heap,
            ],
        )?;
        Ok(())
    }

    fn remove_card(&self, deck_id: DeckId, card_id: CardId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM deck_cards WHERE deck_uuid = ?1 AND card_uuid = ?2;",
            params![deck_id.to_string(), card_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotRegistered { deck_id, card_id });
        }
        Ok(())
    }

    fn get_scheduling(
        &self,
        deck_id: DeckId,
        card_id: CardId,
    ) -> RepoResult<Option<CardScheduling>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SCHEDULING_SELECT_SQL}
             WHERE deck_uuid = ?1 AND card_uuid = ?2;"
        ))?;

        let mut rows = stmt.query(params![deck_id.to_string(), card_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_scheduling_row(row)?));
        }
        Ok(None)
    }

    fn list_heap(&self, query: &HeapListQuery) -> RepoResult<Vec<CardScheduling>> {
        let mut sql = format!("{SCHEDULING_SELECT_SQL} WHERE deck_uuid = ? AND current_heap = ?");
        let mut bind_values: Vec<Value> = vec![
            Value::Text(query.deck_id.to_string()),
            Value::Integer(i64::from(query.heap)),
        ];

        push_exclusion_filters(
            &mut sql,
            &mut bind_values,
            &query.excluded_card_ids,
            &query.excluded_tag_ids,
        );
        sql.push_str(" ORDER BY last_review_at ASC, card_uuid ASC;");

        collect_scheduling_rows(self.conn, &sql, bind_values)
    }

    fn list_unseen(&self, query: &UnseenListQuery) -> RepoResult<Vec<CardScheduling>> {
        let mut sql = format!("{SCHEDULING_SELECT_SQL} WHERE deck_uuid = ? AND current_heap = ?");
        let mut bind_values: Vec<Value> = vec![
            Value::Text(query.deck_id.to_string()),
            Value::Integer(i64::from(UNKNOWN_HEAP)),
        ];

        push_exclusion_filters(
            &mut sql,
            &mut bind_values,
            &query.excluded_card_ids,
            &query.excluded_tag_ids,
        );
        sql.push_str(" ORDER BY last_review_at ASC, card_uuid ASC LIMIT ?;");
        bind_values.push(Value::Integer(i64::from(query.pool_limit)));

        collect_scheduling_rows(self.conn, &sql, bind_values)
    }

    fn save_batch(&mut self, records: &[CardScheduling]) -> RepoResult<()> {
        for record in records {
            record.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for record in records {
            let changed = tx.execute(
                "UPDATE deck_cards
                 SET
                    current_heap = ?3,
                    last_review_at = ?4,
                    expiry_at = ?5,
                    biggest_heap_reached = ?6,
                    times_in_unknown_heap = ?7
                 WHERE deck_uuid = ?1 AND card_uuid = ?2;",
                params![
                    record.deck_id.to_string(),
                    record.card_id.to_string(),
                    record.current_heap,
                    record.last_review_epoch_ms,
                    record.expiry_epoch_ms,
                    record.biggest_heap_reached,
                    record.times_in_unknown_heap,
                ],
            )?;
            if changed == 0 {
                // Dropping the open transaction rolls back every prior update.
                return Err(RepoError::CardNotRegistered {
                    deck_id: record.deck_id,
                    card_id: record.card_id,
                });
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn push_exclusion_filters(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    excluded_card_ids: &[CardId],
    excluded_tag_ids: &[TagId],
) {
    if !excluded_card_ids.is_empty() {
        sql.push_str(" AND card_uuid NOT IN (");
        sql.push_str(&placeholders(excluded_card_ids.len()));
        sql.push(')');
        for card_id in excluded_card_ids {
            bind_values.push(Value::Text(card_id.to_string()));
        }
    }

    if !excluded_tag_ids.is_empty() {
        sql.push_str(
            " AND NOT EXISTS (
                SELECT 1
                FROM card_tags ct
                WHERE ct.card_uuid = deck_cards.card_uuid
                  AND ct.tag_uuid IN (",
        );
        sql.push_str(&placeholders(excluded_tag_ids.len()));
        sql.push_str("))");
        for tag_id in excluded_tag_ids {
            bind_values.push(Value::Text(tag_id.to_string()));
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn collect_scheduling_rows(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<CardScheduling>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_scheduling_row(row)?);
    }
    Ok(records)
}

fn parse_scheduling_row(row: &Row<'_>) -> RepoResult<CardScheduling> {
    let deck_text: String = row.get("deck_uuid")?;
    let card_text: String = row.get("card_uuid")?;

    let current_heap = parse_heap(row.get("current_heap")?, "deck_cards.current_heap")?;
    let biggest_heap_reached = parse_heap(
        row.get("biggest_heap_reached")?,
        "deck_cards.biggest_heap_reached",
    )?;

    let times_raw: i64 = row.get("times_in_unknown_heap")?;
    let times_in_unknown_heap = u32::try_from(times_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid counter `{times_raw}` in deck_cards.times_in_unknown_heap"
        ))
    })?;

    let record = CardScheduling {
        deck_id: parse_uuid(&deck_text, "deck_cards.deck_uuid")?,
        card_id: parse_uuid(&card_text, "deck_cards.card_uuid")?,
        current_heap,
        last_review_epoch_ms: row.get("last_review_at")?,
        expiry_epoch_ms: row.get("expiry_at")?,
        biggest_heap_reached,
        times_in_unknown_heap,
    };
    record.validate()?;
    Ok(record)
}

fn parse_heap(value: i64, column: &str) -> RepoResult<u8> {
    u8::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid heap value `{value}` in {column}")))
}
