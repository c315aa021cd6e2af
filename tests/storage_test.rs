//! Storage layer integration tests against file-backed SQLite.

use promptstore::storage::entities::{rule, system_prompt, template};
use promptstore::storage::{to_map, Controller, DataAccess, Mode, Repo};
use promptstore::AppError;
use sea_orm::{ColumnTrait, Condition};
use serde_json::json;
use tempfile::TempDir;

fn db_url(dir: &TempDir, name: &str) -> String {
    format!("sqlite://{}/{name}.sqlite3?mode=rwc", dir.path().display())
}

async fn connect(dir: &TempDir, name: &str) -> Controller {
    let controller = Controller::connect(&db_url(dir, name), false)
        .await
        .expect("connect");
    controller.sync_schema().await.expect("sync schema");
    controller
}

// ============================================================================
// Create / get
// ============================================================================

#[tokio::test]
async fn create_then_get_returns_input_fields_with_audit_columns() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "create_get").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    let created = repo
        .create(
            controller.conn(),
            json!({ "name": "greeting", "text": "You are a helpful assistant." }),
        )
        .await
        .unwrap();

    assert!(created.id >= 1);
    assert_eq!(created.name, "greeting");
    assert_eq!(created.text, "You are a helpful assistant.");
    assert!(created.deleted_at.is_none());

    let fetched = repo.get(controller.conn(), created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_id_is_a_normal_absent_result() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "get_missing").await;
    let repo = Repo::<rule::ActiveModel>::new();

    assert!(repo.get(controller.conn(), 999).await.unwrap().is_none());
}

#[tokio::test]
async fn create_applies_column_defaults() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "defaults").await;
    let repo = Repo::<template::ActiveModel>::new();

    let created = repo
        .create(
            controller.conn(),
            json!({ "name": "summarize", "body": "Summarize: {input}" }),
        )
        .await
        .unwrap();

    assert_eq!(created.args, "{}");
    assert_eq!(created.meta, "{}");
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_changes_only_named_fields_and_refreshes_updated_at() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "update").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    let created = repo
        .create(
            controller.conn(),
            json!({ "name": "v1", "text": "original text" }),
        )
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let updated = repo
        .update(controller.conn(), created.id, json!({ "name": "v2" }))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "v2");
    assert_eq!(updated.text, "original text");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn update_missing_id_returns_none_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "update_missing").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    let absent = repo
        .update(controller.conn(), 123, json!({ "name": "ghost" }))
        .await
        .unwrap();
    assert!(absent.is_none());

    let rows = repo.list(controller.conn(), 1, 10, None).await.unwrap();
    assert!(rows.is_empty());
}

// ============================================================================
// Delete / soft delete
// ============================================================================

#[tokio::test]
async fn delete_removes_the_row() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "delete").await;
    let repo = Repo::<rule::ActiveModel>::new();

    let created = repo
        .create(
            controller.conn(),
            json!({ "kind": "always", "content": "Prefer short answers." }),
        )
        .await
        .unwrap();

    assert!(repo.delete(controller.conn(), created.id).await.unwrap());
    assert!(repo.get(controller.conn(), created.id).await.unwrap().is_none());
    assert!(!repo.delete(controller.conn(), created.id).await.unwrap());
}

#[tokio::test]
async fn soft_delete_stamps_without_removing() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "soft_delete").await;
    let repo = Repo::<rule::ActiveModel>::new();

    let created = repo
        .create(
            controller.conn(),
            json!({ "kind": "manual", "content": "Cite sources." }),
        )
        .await
        .unwrap();

    assert!(repo.soft_delete(controller.conn(), created.id).await.unwrap());

    let fetched = repo.get(controller.conn(), created.id).await.unwrap().unwrap();
    assert!(fetched.deleted_at.is_some());

    // Deletion is advisory metadata: the row still shows up in listings.
    let rows = repo.list(controller.conn(), 1, 10, None).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn soft_delete_missing_id_returns_false_and_mutates_nothing() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "soft_delete_missing").await;
    let repo = Repo::<rule::ActiveModel>::new();

    assert!(!repo.soft_delete(controller.conn(), 55).await.unwrap());
    assert!(repo.list(controller.conn(), 1, 10, None).await.unwrap().is_empty());
}

// ============================================================================
// Listing, pagination, filters
// ============================================================================

#[tokio::test]
async fn list_pages_through_rows() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "paging").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    for i in 0..5 {
        repo.create(
            controller.conn(),
            json!({ "name": format!("prompt-{i}"), "text": "t" }),
        )
        .await
        .unwrap();
    }

    let first = repo.list(controller.conn(), 1, 2, None).await.unwrap();
    let second = repo.list(controller.conn(), 2, 2, None).await.unwrap();
    let third = repo.list(controller.conn(), 3, 2, None).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);

    // Pages never overlap.
    let mut ids: Vec<i32> = first
        .iter()
        .chain(second.iter())
        .chain(third.iter())
        .map(|m| m.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);

    // Arbitrarily large pages simply select nothing.
    assert!(repo.list(controller.conn(), 999, 2, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_accepts_caller_supplied_conditions() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "conditions").await;
    let repo = Repo::<rule::ActiveModel>::new();

    repo.create(controller.conn(), json!({ "kind": "always", "content": "a" }))
        .await
        .unwrap();
    repo.create(controller.conn(), json!({ "kind": "manual", "content": "b" }))
        .await
        .unwrap();

    let condition = Condition::all().add(rule::Column::Kind.eq(rule::RuleKind::Always));
    let rows = repo
        .list(controller.conn(), 1, 10, Some(condition))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content, "a");
}

#[tokio::test]
async fn list_by_ands_equality_filters() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "list_by").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    repo.create(controller.conn(), json!({ "name": "dup", "text": "first" }))
        .await
        .unwrap();
    repo.create(controller.conn(), json!({ "name": "dup", "text": "second" }))
        .await
        .unwrap();
    repo.create(controller.conn(), json!({ "name": "other", "text": "first" }))
        .await
        .unwrap();

    let rows = repo
        .list_by(
            controller.conn(),
            &[("name", "dup".into()), ("text", "first".into())],
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "first");
}

#[tokio::test]
async fn list_by_unknown_column_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "list_by_unknown").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    let err = repo
        .list_by(controller.conn(), &[("no_such", "x".into())], 1, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

// ============================================================================
// Projection
// ============================================================================

#[tokio::test]
async fn projection_covers_soft_deleted_rows() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "projection").await;
    let repo = Repo::<system_prompt::ActiveModel>::new();

    let created = repo
        .create(controller.conn(), json!({ "name": "p", "text": "t" }))
        .await
        .unwrap();
    repo.soft_delete(controller.conn(), created.id).await.unwrap();

    let fetched = repo.get(controller.conn(), created.id).await.unwrap().unwrap();
    let map = to_map(&fetched, None).unwrap();
    assert!(!map["deleted_at"].is_null());

    let trimmed = to_map(&fetched, Some(&["deleted_at"])).unwrap();
    assert!(!trimmed.contains_key("deleted_at"));
}

// ============================================================================
// Blocking mode
// ============================================================================

#[test]
fn blocking_mode_roundtrip() {
    let dir = TempDir::new().unwrap();
    let factory = DataAccess::new(Mode::Blocking);
    let controller = factory
        .connect_blocking(&db_url(&dir, "blocking"), false)
        .unwrap();
    controller.create_all().unwrap();

    let repo = factory
        .repo::<template::ActiveModel>()
        .blocking()
        .unwrap();

    let created = repo
        .create(
            &controller,
            json!({ "name": "review", "body": "Review this: {input}" }),
        )
        .unwrap();
    assert!(created.id >= 1);

    let fetched = repo.get(&controller, created.id).unwrap().unwrap();
    assert_eq!(fetched.body, "Review this: {input}");

    assert!(repo.soft_delete(&controller, created.id).unwrap());
    let after = repo.get(&controller, created.id).unwrap().unwrap();
    assert!(after.deleted_at.is_some());

    assert!(repo.delete(&controller, created.id).unwrap());
    assert!(repo.get(&controller, created.id).unwrap().is_none());
}

#[test]
fn blocking_and_async_repos_share_pagination_semantics() {
    let blocking = promptstore::BlockingRepo::<rule::ActiveModel>::with_max_per_page(10);
    let non_blocking = Repo::<rule::ActiveModel>::with_max_per_page(10);
    for (page, per) in [(0, 5), (1, 5), (3, 25), (7, 10)] {
        assert_eq!(blocking.paginate(page, per), non_blocking.paginate(page, per));
    }
}

// ============================================================================
// Unique constraints propagate unmodified
// ============================================================================

#[tokio::test]
async fn constraint_violations_surface_as_database_errors() {
    let dir = TempDir::new().unwrap();
    let controller = connect(&dir, "constraints").await;
    let repo = Repo::<template::ActiveModel>::new();

    repo.create(controller.conn(), json!({ "name": "only", "body": "b" }))
        .await
        .unwrap();
    let err = repo
        .create(controller.conn(), json!({ "name": "only", "body": "b2" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}
