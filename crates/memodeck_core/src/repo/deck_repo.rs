//! Account/deck/card/tag persistence.
//!
//! # Responsibility
//! - Provide the collaborator plumbing the scheduling core consumes:
//!   accounts, deck headers, card identity, and tag links.
//!
//! # Invariants
//! - Deck headers are the single source of ownership and algorithm
//!   configuration reads.
//! - Tag names are unique at the storage level.

use crate::heaping::HeapingAlgorithmId;
use crate::model::deck::{Deck, Tag, User};
use crate::model::scheduling::{CardId, DeckId, TagId, UserId};
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for account/deck/card/tag plumbing.
pub trait DeckRepository {
    /// Creates one learner account.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    /// Returns whether the account exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
    /// Creates one deck header.
    fn create_deck(&self, deck: &Deck) -> RepoResult<DeckId>;
    /// Gets one deck header by id.
    fn get_deck(&self, deck_id: DeckId) -> RepoResult<Option<Deck>>;
    /// Records a card identity (content is external to this core).
    fn create_card(&self, card_id: CardId) -> RepoResult<CardId>;
    /// Creates one tag.
    fn create_tag(&self, tag: &Tag) -> RepoResult<TagId>;
    /// Links a tag to a card; duplicate links are ignored.
    fn tag_card(&self, card_id: CardId, tag_id: TagId) -> RepoResult<()>;
}

/// SQLite-backed deck repository.
pub struct SqliteDeckRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDeckRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DeckRepository for SqliteDeckRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (uuid, display_name) VALUES (?1, ?2);",
            params![user.uuid.to_string(), user.display_name.as_str()],
        )?;
        Ok(user.uuid)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_deck(&self, deck: &Deck) -> RepoResult<DeckId> {
        self.conn.execute(
            "INSERT INTO decks (uuid, owner_uuid, name, heaping_algorithm_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                deck.uuid.to_string(),
                deck.owner_uuid.to_string(),
                deck.name.as_str(),
                deck.heaping_algorithm_id,
            ],
        )?;
        Ok(deck.uuid)
    }

    fn get_deck(&self, deck_id: DeckId) -> RepoResult<Option<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, owner_uuid, name, heaping_algorithm_id
             FROM decks
             WHERE uuid = ?1;",
        )?;

        let mut rows = stmt.query([deck_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_deck_row(row)?));
        }
        Ok(None)
    }

    fn create_card(&self, card_id: CardId) -> RepoResult<CardId> {
        self.conn.execute(
            "INSERT INTO cards (uuid) VALUES (?1);",
            [card_id.to_string()],
        )?;
        Ok(card_id)
    }

    fn create_tag(&self, tag: &Tag) -> RepoResult<TagId> {
        self.conn.execute(
            "INSERT INTO tags (uuid, name) VALUES (?1, ?2);",
            params![tag.uuid.to_string(), tag.name.as_str()],
        )?;
        Ok(tag.uuid)
    }

    fn tag_card(&self, card_id: CardId, tag_id: TagId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO card_tags (card_uuid, tag_uuid) VALUES (?1, ?2);",
            params![card_id.to_string(), tag_id.to_string()],
        )?;
        Ok(())
    }
}

fn parse_deck_row(row: &Row<'_>) -> RepoResult<Deck> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("owner_uuid")?;
    let heaping_algorithm_id: HeapingAlgorithmId = row.get("heaping_algorithm_id")?;

    Ok(Deck {
        uuid: parse_uuid(&uuid_text, "decks.uuid")?,
        owner_uuid: parse_uuid(&owner_text, "decks.owner_uuid")?,
        name: row.get("name")?,
        heaping_algorithm_id,
    })
}
