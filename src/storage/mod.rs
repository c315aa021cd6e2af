//! Storage Layer
//!
//! Entity definitions, the dual-mode connection controller, the generic
//! repository (async core plus blocking adapter), the mode-dispatching
//! factory, and the entity-to-map projection helper.

pub mod connection;
pub mod entities;
pub mod factory;
pub mod projection;
pub mod repo;

pub use connection::{sync_schema, Controller, Mode};
pub use factory::{DataAccess, RepoKind};
pub use projection::to_map;
pub use repo::{BlockingRepo, Repo, DEFAULT_MAX_PER_PAGE};
