//! Storage walkthrough: exercises the blocking and non-blocking data-access
//! objects against a local SQLite file. Demonstration driver, not a
//! reusable component.

use anyhow::Result;
use promptstore::storage::entities::{rule, system_prompt};
use promptstore::storage::{to_map, DataAccess, Mode};
use sea_orm::ColumnTrait;
use serde_json::json;

const DB_URL: &str = "sqlite://promptstore_demo.sqlite3?mode=rwc";

fn blocking_walkthrough() -> Result<()> {
    let factory = DataAccess::new(Mode::Blocking);
    let db = factory.connect_blocking(DB_URL, false)?;
    db.create_all()?;

    let prompts = factory.repo::<system_prompt::ActiveModel>().blocking()?;

    let created = prompts.create(
        &db,
        json!({ "name": "greeting", "text": "You are a helpful assistant." }),
    )?;
    println!("created system prompt #{}", created.id);

    let page = prompts.list(&db, 1, 10, None)?;
    println!("fetched {} prompt(s)", page.len());

    prompts.soft_delete(&db, created.id)?;
    let fetched = prompts.get(&db, created.id)?.expect("soft-deleted rows stay visible");
    println!("after soft delete: {:?}", to_map(&fetched, None)?);

    Ok(())
}

async fn async_walkthrough() -> Result<()> {
    let factory = DataAccess::new(Mode::NonBlocking);
    let db = factory.connect(DB_URL, false).await?;
    db.sync_schema().await?;

    let rules = factory.repo::<rule::ActiveModel>().non_blocking()?;

    let created = rules
        .create(
            db.conn(),
            json!({ "kind": "always", "content": "Answer in plain language." }),
        )
        .await?;
    println!("created rule #{} (async)", created.id);

    let always = rules
        .list(
            db.conn(),
            1,
            10,
            Some(sea_orm::Condition::all().add(rule::Column::Kind.eq(rule::RuleKind::Always))),
        )
        .await?;
    println!("fetched {} always-applied rule(s) (async)", always.len());

    let renamed = rules
        .update(db.conn(), created.id, json!({ "content": "Answer briefly." }))
        .await?;
    println!("updated rule: {:?}", renamed.map(|r| r.content));

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    blocking_walkthrough()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_walkthrough())?;

    Ok(())
}
