//! Data-Access Factory
//!
//! Chooses between the blocking and non-blocking data-access
//! implementations and wires a connection for a given entity type.

use sea_orm::ActiveModelTrait;

use crate::storage::connection::{Controller, Mode};
use crate::storage::repo::{BlockingRepo, Repo, DEFAULT_MAX_PER_PAGE};
use crate::utils::error::{AppError, AppResult};

/// Factory for mode-matched connections and repositories
#[derive(Debug, Clone)]
pub struct DataAccess {
    mode: Mode,
    max_per_page: u64,
}

impl DataAccess {
    /// Factory with the default page-size ceiling
    pub fn new(mode: Mode) -> Self {
        Self::with_max_per_page(mode, DEFAULT_MAX_PER_PAGE)
    }

    /// Factory with a custom page-size ceiling for every repository it hands out
    pub fn with_max_per_page(mode: Mode, max_per_page: u64) -> Self {
        Self { mode, max_per_page }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Open a non-blocking connection; usage error on a blocking factory.
    pub async fn connect(&self, url: &str, echo: bool) -> AppResult<Controller> {
        match self.mode {
            Mode::NonBlocking => Controller::connect(url, echo).await,
            Mode::Blocking => Err(AppError::usage(
                "blocking factory: use `connect_blocking` instead",
            )),
        }
    }

    /// Open a blocking connection; usage error on a non-blocking factory.
    pub fn connect_blocking(&self, url: &str, echo: bool) -> AppResult<Controller> {
        match self.mode {
            Mode::Blocking => Controller::connect_blocking(url, echo),
            Mode::NonBlocking => Err(AppError::usage(
                "non-blocking factory: use `connect` instead",
            )),
        }
    }

    /// A repository for the given entity type in this factory's mode.
    pub fn repo<A>(&self) -> RepoKind<A>
    where
        A: ActiveModelTrait,
    {
        match self.mode {
            Mode::Blocking => RepoKind::Blocking(BlockingRepo::with_max_per_page(self.max_per_page)),
            Mode::NonBlocking => RepoKind::NonBlocking(Repo::with_max_per_page(self.max_per_page)),
        }
    }
}

/// A mode-tagged repository handed out by [`DataAccess::repo`]
#[derive(Debug, Clone)]
pub enum RepoKind<A>
where
    A: ActiveModelTrait,
{
    Blocking(BlockingRepo<A>),
    NonBlocking(Repo<A>),
}

impl<A> RepoKind<A>
where
    A: ActiveModelTrait,
{
    /// Unwrap the blocking implementation; usage error otherwise.
    pub fn blocking(self) -> AppResult<BlockingRepo<A>> {
        match self {
            RepoKind::Blocking(repo) => Ok(repo),
            RepoKind::NonBlocking(_) => Err(AppError::usage(
                "this factory produces non-blocking repositories",
            )),
        }
    }

    /// Unwrap the non-blocking implementation; usage error otherwise.
    pub fn non_blocking(self) -> AppResult<Repo<A>> {
        match self {
            RepoKind::NonBlocking(repo) => Ok(repo),
            RepoKind::Blocking(_) => Err(AppError::usage(
                "this factory produces blocking repositories",
            )),
        }
    }
}
