use chrono::Duration;
use quiz_core::model::{AnswerValue, Percentage, QuestionId, SessionId};
use quiz_core::time::fixed_now;
use storage::repository::{ResponseRepository, SessionRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn sid(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

fn answer(q: u8, v: i64) -> (QuestionId, AnswerValue) {
    let id = QuestionId::new(q);
    (id, AnswerValue::new(id, v).unwrap())
}

fn pct(v: i64) -> Percentage {
    Percentage::new(v).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_persists_sessions_and_answers() {
    let repo = connect("memdb_roundtrip").await;
    let id = sid("roundtrip_1");
    let now = fixed_now();

    repo.create_session(&id, now).await.unwrap();
    for (q, a) in [answer(5, 1), answer(1, 2), answer(3, 4)] {
        repo.record_answer(&id, q, a, now).await.unwrap();
    }
    repo.complete_session(&id, pct(83), now + Duration::minutes(3))
        .await
        .unwrap();

    let session = repo.get_session(&id).await.unwrap().expect("session");
    assert!(session.is_completed());
    assert_eq!(session.created_at(), now);
    assert_eq!(session.overlap_percentage(), Some(pct(83)));
    assert_eq!(session.completed_at(), Some(now + Duration::minutes(3)));

    let answers = repo.get_answers(&id).await.unwrap();
    let pairs: Vec<(u8, u8)> = answers
        .iter()
        .map(|r| (r.question_id.value(), r.answer.value()))
        .collect();
    assert_eq!(pairs, vec![(1, 2), (3, 4), (5, 1)]);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_answers_and_second_completion() {
    let repo = connect("memdb_conflicts").await;
    let id = sid("conflicts");
    let now = fixed_now();

    let (q, a) = answer(2, 3);
    assert!(matches!(
        repo.record_answer(&id, q, a, now).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.complete_session(&id, pct(10), now).await,
        Err(StorageError::NotFound)
    ));

    repo.create_session(&id, now).await.unwrap();
    repo.create_session(&id, now + Duration::hours(2)).await.unwrap();
    repo.record_answer(&id, q, a, now).await.unwrap();
    let (q, other) = answer(2, 5);
    assert!(matches!(
        repo.record_answer(&id, q, other, now).await,
        Err(StorageError::Conflict)
    ));

    repo.complete_session(&id, pct(60), now).await.unwrap();
    assert!(matches!(
        repo.complete_session(&id, pct(99), now).await,
        Err(StorageError::Conflict)
    ));

    let session = repo.get_session(&id).await.unwrap().unwrap();
    assert_eq!(session.created_at(), now);
    assert_eq!(session.overlap_percentage(), Some(pct(60)));
    let answers = repo.get_answers(&id).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer.value(), 3);
}

#[tokio::test]
async fn sqlite_aggregates_only_completed_sessions() {
    let repo = connect("memdb_aggregates").await;
    let now = fixed_now();

    for (i, score) in [(1, 40), (2, 70)] {
        let id = sid(&format!("done{i}"));
        repo.create_session(&id, now).await.unwrap();
        let (q, a) = answer(1, 2);
        repo.record_answer(&id, q, a, now).await.unwrap();
        repo.complete_session(&id, pct(score), now + Duration::minutes(i))
            .await
            .unwrap();
    }
    let open = sid("open");
    repo.create_session(&open, now).await.unwrap();
    let (q, a) = answer(1, 5);
    repo.record_answer(&open, q, a, now).await.unwrap();

    assert_eq!(
        repo.list_completed_percentages().await.unwrap(),
        vec![pct(40), pct(70)]
    );

    let tallies = repo.answer_counts().await.unwrap();
    assert_eq!(tallies.len(), 1);
    assert_eq!(tallies[0].question_id.value(), 1);
    assert_eq!(tallies[0].answer.value(), 2);
    assert_eq!(tallies[0].count, 2);

    let totals = repo.storage_totals().await.unwrap();
    assert_eq!(totals.total_sessions, 3);
    assert_eq!(totals.completed_sessions, 2);
    assert_eq!(totals.total_responses, 3);
    assert_eq!(totals.oldest_session, Some(now));
    assert_eq!(totals.newest_session, Some(now));
}

#[tokio::test]
async fn sqlite_stale_cleanup_cascades_responses() {
    let repo = connect("memdb_cleanup").await;
    let now = fixed_now();
    let stale = sid("stale");
    let kept = sid("kept");

    repo.create_session(&stale, now - Duration::hours(48))
        .await
        .unwrap();
    let (q, a) = answer(4, 1);
    repo.record_answer(&stale, q, a, now).await.unwrap();
    repo.create_session(&kept, now - Duration::hours(48))
        .await
        .unwrap();
    repo.complete_session(&kept, pct(50), now).await.unwrap();

    let removed = repo
        .delete_stale_sessions(now - Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(repo.get_session(&stale).await.unwrap().is_none());
    assert!(repo.get_answers(&stale).await.unwrap().is_empty());
    assert!(repo.get_session(&kept).await.unwrap().is_some());
    assert_eq!(repo.storage_totals().await.unwrap().total_responses, 0);
}

#[tokio::test]
async fn sqlite_counts_sessions_by_literal_prefix() {
    let repo = connect("memdb_prefix").await;
    let now = fixed_now();
    for raw in ["demo1", "demo2", "demox_1", "real"] {
        repo.create_session(&sid(raw), now).await.unwrap();
    }

    assert_eq!(repo.count_sessions_with_prefix("demo").await.unwrap(), 3);
    assert_eq!(repo.count_sessions_with_prefix("demo_").await.unwrap(), 0);
    assert_eq!(repo.count_sessions_with_prefix("nope").await.unwrap(), 0);
}

#[tokio::test]
async fn storage_sqlite_migrates_twice_without_error() {
    let url = "sqlite:file:memdb_storage?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("storage");
    let repo = SqliteRepository::connect(url).await.expect("connect");
    repo.migrate().await.expect("second migrate");

    storage
        .sessions
        .create_session(&sid("shared"), fixed_now())
        .await
        .unwrap();
    assert!(repo.get_session(&sid("shared")).await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_refuses_completion_before_creation() {
    let repo = connect("memdb_time_range").await;
    let id = sid("time_range");
    let now = fixed_now();
    repo.create_session(&id, now).await.unwrap();

    assert!(matches!(
        repo.complete_session(&id, pct(50), now - Duration::seconds(1)).await,
        Err(StorageError::InvalidTransition(_))
    ));

    let session = repo.get_session(&id).await.unwrap().expect("still readable");
    assert!(!session.is_completed());
    assert!(repo.list_completed_percentages().await.unwrap().is_empty());

    repo.complete_session(&id, pct(50), now).await.unwrap();
    let session = repo.get_session(&id).await.unwrap().expect("session");
    assert_eq!(session.completed_at(), Some(now));
}
