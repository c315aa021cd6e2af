//! Connection Controller
//!
//! Opens a database connection from a connection string in either blocking
//! or non-blocking mode and hands out the session handle that every
//! repository call receives explicitly. The blocking mode owns a tokio
//! runtime and drives the same async engine to completion, so both modes
//! share one connection path.

use std::future::Future;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};

use crate::storage::entities::prelude::{Rule, SystemPrompt, Template};
use crate::utils::error::{AppError, AppResult};

/// Execution mode for a connection and its data-access objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Calls occupy the calling thread until I/O completes
    Blocking,
    /// Calls suspend at the I/O boundary
    NonBlocking,
}

/// Database controller for both blocking and non-blocking operations
#[derive(Debug)]
pub struct Controller {
    url: String,
    mode: Mode,
    conn: DatabaseConnection,
    /// Present in blocking mode only; drives async engine calls
    runtime: Option<tokio::runtime::Runtime>,
}

impl Controller {
    /// Open a non-blocking connection.
    ///
    /// `echo` enables statement logging on the underlying engine. The URL
    /// is passed through to the engine unmodified.
    pub async fn connect(url: &str, echo: bool) -> AppResult<Self> {
        let conn = open(url, echo).await?;
        Ok(Self {
            url: url.to_string(),
            mode: Mode::NonBlocking,
            conn,
            runtime: None,
        })
    }

    /// Open a blocking connection.
    ///
    /// Builds an owned runtime and connects on it. Must not be called from
    /// within an async context.
    pub fn connect_blocking(url: &str, echo: bool) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(open(url, echo))?;
        Ok(Self {
            url: url.to_string(),
            mode: Mode::Blocking,
            conn,
            runtime: Some(runtime),
        })
    }

    /// The connection string this controller was opened with
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The execution mode of this controller
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The session handle passed into each data-access call
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Drive a future to completion on the blocking runtime.
    ///
    /// Usage error on a non-blocking controller; `.await` directly there.
    pub fn block_on<F: Future>(&self, fut: F) -> AppResult<F::Output> {
        match &self.runtime {
            Some(runtime) => Ok(runtime.block_on(fut)),
            None => Err(AppError::usage(
                "a non-blocking controller cannot drive futures; await them in the async context",
            )),
        }
    }

    /// Create all entity tables.
    ///
    /// Only works in blocking mode; a non-blocking controller must run
    /// [`Controller::sync_schema`] inside its async context instead.
    pub fn create_all(&self) -> AppResult<()> {
        match self.mode {
            Mode::Blocking => self.block_on(sync_schema(&self.conn))?,
            Mode::NonBlocking => Err(AppError::usage(
                "use `sync_schema().await` inside the async context for non-blocking connections",
            )),
        }
    }

    /// Schema-sync primitive for non-blocking connections.
    pub async fn sync_schema(&self) -> AppResult<()> {
        sync_schema(&self.conn).await
    }
}

async fn open(url: &str, echo: bool) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(echo);
    Ok(Database::connect(options).await?)
}

/// Create every entity table if it does not already exist.
pub async fn sync_schema(db: &DatabaseConnection) -> AppResult<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = [
        schema.create_table_from_entity(SystemPrompt),
        schema.create_table_from_entity(Rule),
        schema.create_table_from_entity(Template),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(backend.build(statement)).await?;
    }

    Ok(())
}
