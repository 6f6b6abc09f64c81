use std::{fs, path::PathBuf, time::SystemTime};

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

use front_counter::{
    Category, CategoryId, Color, CounterError, Entry, EntryId, FrontCounter, UndoOutcome,
    constants::{DEFAULT_CATEGORIES, DELETED_CATEGORY_LABEL},
    domain,
    export::Exporter,
    storage::{FileStore, MemoryStore, Store},
    time::ManualClock,
};

fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn morning() -> i64 {
    jst()
        .with_ymd_and_hms(2026, 10, 16, 9, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
        .timestamp_millis()
}

fn counter() -> (FrontCounter<MemoryStore, ManualClock, FixedOffset>, ManualClock) {
    let clock = ManualClock::new(morning());
    let counter = FrontCounter::open(MemoryStore::new(), clock.clone(), jst()).unwrap();
    (counter, clock)
}

fn unique_dir(prefix: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    PathBuf::from(format!("/tmp/{}_{}", prefix, now))
}

#[test]
fn undo_only_reverts_the_latest_tap() {
    let (mut counter, clock) = counter();
    let cat = counter.categories().list()[0].id.clone();

    let a = counter.tap(&cat).unwrap();
    clock.advance(5_000);
    let b = counter.tap(&cat).unwrap();

    assert_eq!(counter.undo().unwrap(), UndoOutcome::Undone(b));
    assert_eq!(counter.undo().unwrap(), UndoOutcome::NothingToUndo);
    assert_eq!(counter.entries().all(), vec![a]);
}

#[test]
fn undo_window_expires_after_thirty_seconds() {
    let (mut counter, clock) = counter();
    let cat = counter.categories().list()[0].id.clone();

    let a = counter.tap(&cat).unwrap();
    assert!(counter.can_undo());
    clock.advance(30_000);
    assert!(!counter.can_undo());

    assert_eq!(counter.undo().unwrap(), UndoOutcome::NothingToUndo);
    assert_eq!(counter.entries().all(), vec![a]);
}

#[test]
fn scheduled_expiry_from_superseded_tap_is_ignored() {
    let (mut counter, clock) = counter();
    let cat = counter.categories().list()[0].id.clone();

    counter.tap(&cat).unwrap();
    let first = counter.undo_expiry().unwrap();

    clock.advance(1_000);
    let b = counter.tap(&cat).unwrap();
    let second = counter.undo_expiry().unwrap();

    clock.set(first.deadline_ms());
    assert!(!counter.expire_undo(first));
    assert!(counter.can_undo());

    clock.set(second.deadline_ms());
    assert!(counter.expire_undo(second));
    assert!(!counter.can_undo());
    assert!(!counter.expire_undo(second));
    assert_eq!(counter.entries().all().last(), Some(&b));
}

#[test]
fn deleted_category_id_is_not_reissued() {
    let (mut counter, _) = counter();
    let a = counter.categories().add("A", Color::Green).unwrap();
    let e = counter.tap(&a.id).unwrap();
    assert!(counter.categories().delete(&a.id).unwrap());

    let b = counter.categories().add("B", Color::Blue).unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(counter.categories().resolve_name(&e.category_id), DELETED_CATEGORY_LABEL);
    assert_eq!(counter.today_counts().get(&b.id), None);
}

#[test]
fn orphaned_entries_survive_category_delete() {
    let (mut counter, _) = counter();
    let c = counter.categories().add("受付", Color::Purple).unwrap();
    let e = counter.tap(&c.id).unwrap();

    assert!(counter.categories().delete(&c.id).unwrap());

    let today = counter.today();
    let day = counter.entries().query_day(today);
    assert_eq!(day, vec![e.clone()]);
    assert_eq!(day[0].category_id, c.id);
    assert_eq!(counter.categories().resolve_name(&e.category_id), DELETED_CATEGORY_LABEL);

    let timeline = counter.timeline();
    assert!(timeline[0].category.is_none());
}

#[test]
fn day_window_excludes_neighbouring_days() {
    let (mut counter, clock) = counter();
    let cat = CategoryId::new("cat_x");
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
    let midnight = jst()
        .with_ymd_and_hms(2026, 10, 15, 0, 0, 0)
        .unwrap()
        .timestamp_millis();

    for ts in [midnight - 1, midnight, midnight + 86_399_999, midnight + 86_400_000] {
        clock.set(ts);
        counter.tap(&cat).unwrap();
    }

    let mut found: Vec<i64> = counter
        .entries()
        .query_day(date)
        .iter()
        .map(|e| e.timestamp)
        .collect();
    found.sort();
    assert_eq!(found, vec![midnight, midnight + 86_399_999]);
}

#[test]
fn export_quotes_embedded_commas_and_rejects_empty() {
    let tz = jst();
    let categories = vec![Category {
        id: CategoryId::new("c1"),
        name: "A,B".to_string(),
        color: Color::Green,
        order: 0,
    }];
    let entries = vec![Entry {
        id: EntryId::new("e1"),
        category_id: CategoryId::new("c1"),
        timestamp: morning(),
    }];

    let csv = Exporter::new(&tz).export(&entries, &categories).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('\u{FEFF}'));
    assert_eq!(lines[1], "\"2026/10/16 09:00\",\"A,B\",\"c1\"");

    assert!(matches!(
        Exporter::new(&tz).export(&[], &categories),
        Err(CounterError::EmptyExport)
    ));
}

#[test]
fn seeding_twice_installs_defaults_once() {
    let clock = ManualClock::new(morning());
    let mut counter = FrontCounter::new(MemoryStore::new(), clock, jst());

    assert!(counter.categories().seed_if_empty().unwrap());
    assert!(!counter.categories().seed_if_empty().unwrap());
    assert_eq!(counter.categories().list().len(), DEFAULT_CATEGORIES.len());
}

#[test]
fn file_store_survives_reopen() {
    let dir = unique_dir("fc_reopen");
    let clock = ManualClock::new(morning());

    let tapped = {
        let backend = FileStore::open(&dir).unwrap();
        let mut counter = FrontCounter::open(backend, clock.clone(), jst()).unwrap();
        let cat = counter.categories().list()[1].id.clone();
        counter.tap(&cat).unwrap()
    };

    let backend = FileStore::open(&dir).unwrap();
    let mut counter = FrontCounter::open(backend, clock, jst()).unwrap();
    assert_eq!(counter.entries().all(), vec![tapped.clone()]);
    assert_eq!(counter.categories().list().len(), DEFAULT_CATEGORIES.len());

    let names = domain::category_map(&counter.categories().list());
    assert_eq!(
        domain::resolve_category_name(&names, &tapped.category_id),
        DEFAULT_CATEGORIES[1].name
    );

    fs::remove_dir_all(dir).ok();
}

#[test]
fn pending_undo_carries_across_reopen() {
    let clock = ManualClock::new(morning());
    let mut first = FrontCounter::open(MemoryStore::new(), clock.clone(), jst()).unwrap();
    let cat = first.categories().list()[0].id.clone();
    first.tap(&cat).unwrap();
    let pending = first.pending_undo().unwrap();

    let backend = first.store().backend().clone();
    clock.advance(10_000);
    let mut second = FrontCounter::open(backend, clock.clone(), jst()).unwrap();
    assert!(second.restore_pending_undo(pending).is_some());
    assert!(matches!(second.undo().unwrap(), UndoOutcome::Undone(_)));
    assert!(second.entries().all().is_empty());
}

#[test]
fn corrupt_entries_value_reads_as_empty_log() {
    let dir = unique_dir("fc_corrupt");
    let backend = FileStore::open(&dir).unwrap();
    fs::write(backend.path_for("fc_entries"), "not json at all").unwrap();

    let store = Store::new(backend);
    assert!(store.entries().is_empty());

    fs::remove_dir_all(dir).ok();
}
