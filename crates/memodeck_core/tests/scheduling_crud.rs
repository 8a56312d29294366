use memodeck_core::db::open_db_in_memory;
use memodeck_core::{
    CardScheduling, Deck, DeckRepository, RepoError, SchedulingRepository, SqliteDeckRepository,
    SqliteSchedulingRepository, User, DEFAULT_HEAPING_ID, UNKNOWN_HEAP,
};
use uuid::Uuid;

#[test]
fn register_card_creates_unseen_record() {
    let mut conn = open_db_in_memory().unwrap();
    let (_, deck_id) = setup_deck(&conn);
    let card_id = new_card(&conn);

    let repo = SqliteSchedulingRepository::new(&mut conn);
    repo.register_card(deck_id, card_id, 5_000).unwrap();

    let record = repo.get_scheduling(deck_id, card_id).unwrap().unwrap();
    assert_eq!(record.deck_id, deck_id);
    assert_eq!(record.card_id, card_id);
    assert_eq!(record.current_heap, UNKNOWN_HEAP);
    assert_eq!(record.last_review_epoch_ms, 5_000);
    assert_eq!(record.expiry_epoch_ms, None);
    assert_eq!(record.biggest_heap_reached, UNKNOWN_HEAP);
    assert_eq!(record.times_in_unknown_heap, 1);
}

#[test]
fn register_card_rejects_duplicate_registration() {
    let mut conn = open_db_in_memory().unwrap();
    let (_, deck_id) = setup_deck(&conn);
    let card_id = new_card(&conn);

    let repo = SqliteSchedulingRepository::new(&mut conn);
    repo.register_card(deck_id, card_id, 5_000).unwrap();

    let err = repo.register_card(deck_id, card_id, 6_000).unwrap_err();
    assert!(matches!(
        err,
        RepoError::AlreadyRegistered { deck_id: d, card_id: c } if d == deck_id && c == card_id
    ));
}

#[test]
fn register_card_rejects_unknown_deck() {
    let mut conn = open_db_in_memory().unwrap();
    let card_id = new_card(&conn);
    let missing_deck = Uuid::new_v4();

    let repo = SqliteSchedulingRepository::new(&mut conn);
    let err = repo.register_card(missing_deck, card_id, 5_000).unwrap_err();
    assert!(matches!(err, RepoError::DeckNotFound(d) if d == missing_deck));
}

#[test]
fn remove_card_drops_the_record() {
    let mut conn = open_db_in_memory().unwrap();
    let (_, deck_id) = setup_deck(&conn);
    let card_id = new_card(&conn);

    let repo = SqliteSchedulingRepository::new(&mut conn);
    repo.register_card(deck_id, card_id, 5_000).unwrap();
    repo.remove_card(deck_id, card_id).unwrap();

    assert!(repo.get_scheduling(deck_id, card_id).unwrap().is_none());
    let err = repo.remove_card(deck_id, card_id).unwrap_err();
    assert!(matches!(err, RepoError::CardNotRegistered { .. }));
}

#[test]
fn save_batch_rejects_invalid_records_before_touching_storage() {
    let mut conn = open_db_in_memory().unwrap();
    let (_, deck_id) = setup_deck(&conn);
    let card_id = new_card(&conn);

    let mut repo = SqliteSchedulingRepository::new(&mut conn);
    repo.register_card(deck_id, card_id, 5_000).unwrap();

    // Learned heap without a cached expiry breaks a record invariant.
    let mut broken = repo.get_scheduling(deck_id, card_id).unwrap().unwrap();
    broken.current_heap = 2;
    broken.biggest_heap_reached = 2;
    broken.expiry_epoch_ms = None;

    let err = repo.save_batch(&[broken]).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let unchanged = repo.get_scheduling(deck_id, card_id).unwrap().unwrap();
    assert_eq!(unchanged.current_heap, UNKNOWN_HEAP);
}

#[test]
fn scheduling_record_serialization_uses_expected_wire_fields() {
    let deck_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let card_id = Uuid::parse_str("99999999-8888-4777-a666-555555555555").unwrap();
    let mut record = CardScheduling::new_unseen(deck_id, card_id, 1_700_000_000_000);
    record.apply_move(2, 1_700_000_100_000, Some(1_700_345_700_000));

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["deck_id"], deck_id.to_string());
    assert_eq!(json["card_id"], card_id.to_string());
    assert_eq!(json["current_heap"], 2);
    assert_eq!(json["last_review_epoch_ms"], 1_700_000_100_000_i64);
    assert_eq!(json["expiry_epoch_ms"], 1_700_345_700_000_i64);
    assert_eq!(json["biggest_heap_reached"], 2);
    assert_eq!(json["times_in_unknown_heap"], 1);

    let decoded: CardScheduling = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

fn setup_deck(conn: &rusqlite::Connection) -> (Uuid, Uuid) {
    let repo = SqliteDeckRepository::new(conn);
    let user = User::new("learner");
    repo.create_user(&user).unwrap();
    let deck = Deck::new(user.uuid, "spanish", DEFAULT_HEAPING_ID);
    repo.create_deck(&deck).unwrap();
    (user.uuid, deck.uuid)
}

fn new_card(conn: &rusqlite::Connection) -> Uuid {
    let card_id = Uuid::new_v4();
    SqliteDeckRepository::new(conn).create_card(card_id).unwrap();
    card_id
}
