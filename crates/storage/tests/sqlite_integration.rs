use chrono::Duration;
use quiz_core::model::{Bucket, DailyCounter, ProgressEntry, QuestionId};
use quiz_core::time::fixed_now;
use storage::repository::{DailyCounterRepository, ProgressRepository};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_round_trips_progress_entries() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = QuestionId::new("ana-0001");
    assert!(repo.get_entry(&id).await.unwrap().is_none());

    let mut entry = ProgressEntry::first_answer(true, fixed_now());
    repo.upsert_entry(&id, &entry).await.unwrap();

    let fetched = repo.get_entry(&id).await.unwrap().unwrap();
    assert_eq!(fetched.bucket(), Bucket::B);
    assert_eq!(fetched.seen(), 1);
    assert_eq!(fetched.last_seen(), fixed_now());

    // Upsert replaces, it does not duplicate.
    entry.record(false, fixed_now() + Duration::minutes(1));
    repo.upsert_entry(&id, &entry).await.unwrap();

    let all = repo.all_entries().await.unwrap();
    assert_eq!(all.len(), 1);
    let updated = all.get(&id).unwrap();
    assert_eq!(updated.bucket(), Bucket::A);
    assert_eq!(updated.wrong(), 1);
    assert_eq!(updated.seen(), 2);
}

#[tokio::test]
async fn sqlite_persists_daily_counter_singleton() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_daily?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.get_counter().await.unwrap().is_none());

    let mut counter = DailyCounter::new(fixed_now().date_naive());
    counter.record(true);
    counter.record(false);
    repo.save_counter(&counter).await.unwrap();

    let fetched = repo.get_counter().await.unwrap().unwrap();
    assert_eq!(fetched, counter);

    // Saving again overwrites the singleton row.
    counter.record(true);
    repo.save_counter(&counter).await.unwrap();
    let fetched = repo.get_counter().await.unwrap().unwrap();
    assert_eq!(fetched.seen(), 3);
    assert_eq!(fetched.correct(), 2);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first run");
    repo.migrate().await.expect("second run");
}
