//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for scheduling state.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Repository writes validate scheduling records before SQL mutations.
//! - Repository APIs return semantic errors (`DeckNotFound`,
//!   `CardNotRegistered`) in addition to DB transport errors.

pub mod deck_repo;
pub mod scheduling_repo;

use crate::db::DbError;
use crate::model::scheduling::{CardId, DeckId, SchedulingValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by deck and scheduling persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(SchedulingValidationError),
    Db(DbError),
    /// Referenced deck does not exist.
    DeckNotFound(DeckId),
    /// The card has no scheduling record in the deck.
    CardNotRegistered { deck_id: DeckId, card_id: CardId },
    /// The card is already registered in the deck.
    AlreadyRegistered { deck_id: DeckId, card_id: CardId },
    /// Persisted row cannot be decoded into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DeckNotFound(deck_id) => write!(f, "deck not found: {deck_id}"),
            Self::CardNotRegistered { deck_id, card_id } => {
                write!(f, "card {card_id} is not registered in deck {deck_id}")
            }
            Self::AlreadyRegistered { deck_id, card_id } => {
                write!(f, "card {card_id} is already registered in deck {deck_id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted row: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchedulingValidationError> for RepoError {
    fn from(value: SchedulingValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
