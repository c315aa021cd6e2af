//! Generic Data-Access Objects
//!
//! One query-construction core (`Repo`) executed in two ways: directly with
//! `.await` on a non-blocking connection, or through the thin
//! [`BlockingRepo`] adapter that drives the same futures on a blocking
//! controller's runtime. Business logic is never duplicated across the two
//! modes.
//!
//! Soft-deleted rows are deliberately NOT excluded from any read: deletion
//! is advisory metadata, not a filter predicate. Callers that want to hide
//! them add the predicate themselves via `list` conditions.

use std::marker::PhantomData;
use std::str::FromStr;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait, QueryFilter, QuerySelect, Select, Value,
};
use serde::Deserialize;
use serde_json::json;

use crate::storage::connection::Controller;
use crate::utils::error::{AppError, AppResult};
use crate::utils::time;

/// Default ceiling on the number of rows a single page may return
pub const DEFAULT_MAX_PER_PAGE: u64 = 100;

type EntityOf<A> = <A as ActiveModelTrait>::Entity;
type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

/// Generic repository bound to one entity type.
///
/// Holds the page-size ceiling and builds every statement; the async
/// methods execute them on the session passed in by the caller.
#[derive(Debug, Clone)]
pub struct Repo<A>
where
    A: ActiveModelTrait,
{
    max_per_page: u64,
    marker: PhantomData<A>,
}

impl<A> Default for Repo<A>
where
    A: ActiveModelTrait,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Repo<A>
where
    A: ActiveModelTrait,
{
    /// Repository with the default page-size ceiling
    pub fn new() -> Self {
        Self::with_max_per_page(DEFAULT_MAX_PER_PAGE)
    }

    /// Repository with a custom page-size ceiling
    pub fn with_max_per_page(max_per_page: u64) -> Self {
        Self {
            max_per_page,
            marker: PhantomData,
        }
    }

    /// Clamp paging inputs into an `(offset, limit)` pair.
    ///
    /// `page` is clamped to a minimum of 1 and `limit` to the ceiling;
    /// arbitrarily large pages are valid and simply select nothing.
    pub fn paginate(&self, page: u64, items_per_page: u64) -> (u64, u64) {
        let page = page.max(1);
        let limit = items_per_page.min(self.max_per_page);
        ((page - 1) * limit, limit)
    }

    /// Build a paged select with optional caller-supplied predicates.
    ///
    /// No ORDER BY is applied: rows come back in the mapper's natural
    /// order, which callers must not rely on.
    fn select_page(
        &self,
        page: u64,
        items_per_page: u64,
        conditions: Option<Condition>,
    ) -> Select<EntityOf<A>> {
        let (offset, limit) = self.paginate(page, items_per_page);
        let mut query = <EntityOf<A>>::find();
        if let Some(conditions) = conditions {
            query = query.filter(conditions);
        }
        query.offset(offset).limit(limit)
    }

    /// Build a paged select from ANDed equality predicates.
    fn select_by(
        &self,
        filters: &[(&str, Value)],
        page: u64,
        items_per_page: u64,
    ) -> AppResult<Select<EntityOf<A>>> {
        let mut condition = Condition::all();
        for (name, value) in filters {
            let column = <EntityOf<A> as EntityTrait>::Column::from_str(name)
                .map_err(|_| AppError::validation(format!("unknown column `{name}`")))?;
            condition = condition.add(column.eq(value.clone()));
        }
        Ok(self.select_page(page, items_per_page, Some(condition)))
    }
}

impl<A> Repo<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A> + for<'de> Deserialize<'de>,
    <<EntityOf<A> as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    /// Up to `limit` rows starting at the page's offset, optionally
    /// filtered by caller-supplied predicates.
    pub async fn list(
        &self,
        db: &DatabaseConnection,
        page: u64,
        items_per_page: u64,
        conditions: Option<Condition>,
    ) -> AppResult<Vec<ModelOf<A>>> {
        Ok(self
            .select_page(page, items_per_page, conditions)
            .all(db)
            .await?)
    }

    /// Same paging as [`Repo::list`], filtered by ANDed equality
    /// predicates derived from name/value pairs.
    ///
    /// An unknown column name is a validation error.
    pub async fn list_by(
        &self,
        db: &DatabaseConnection,
        filters: &[(&str, Value)],
        page: u64,
        items_per_page: u64,
    ) -> AppResult<Vec<ModelOf<A>>> {
        Ok(self
            .select_by(filters, page, items_per_page)?
            .all(db)
            .await?)
    }

    /// Single-row lookup by primary key; absence is a normal outcome.
    pub async fn get(&self, db: &DatabaseConnection, id: i32) -> AppResult<Option<ModelOf<A>>> {
        Ok(<EntityOf<A>>::find_by_id(id).one(db).await?)
    }

    /// Build a row from a field map, stamp the audit timestamps, insert,
    /// and return the refreshed (post-insert) entity.
    pub async fn create(
        &self,
        db: &DatabaseConnection,
        mut fields: serde_json::Value,
    ) -> AppResult<ModelOf<A>> {
        let map = object_fields(&mut fields)?;
        let now = serde_json::to_value(time::now())?;
        map.entry("created_at").or_insert(now.clone());
        map.entry("updated_at").or_insert(now);

        let active = A::from_json(fields)?;
        Ok(active.insert(db).await?)
    }

    /// Assign each given field on the row, refresh `updated_at`, persist,
    /// and return the refreshed entity. `None` when the id does not exist.
    pub async fn update(
        &self,
        db: &DatabaseConnection,
        id: i32,
        mut fields: serde_json::Value,
    ) -> AppResult<Option<ModelOf<A>>> {
        let Some(model) = self.get(db, id).await? else {
            return Ok(None);
        };

        let map = object_fields(&mut fields)?;
        map.insert("updated_at".to_string(), serde_json::to_value(time::now())?);

        let mut active = model.into_active_model();
        active.set_from_json(fields)?;
        Ok(Some(active.update(db).await?))
    }

    /// Physically remove the row. `false` when the id does not exist.
    pub async fn delete(&self, db: &DatabaseConnection, id: i32) -> AppResult<bool> {
        if self.get(db, id).await?.is_none() {
            return Ok(false);
        }
        let result = <EntityOf<A>>::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Mark the row as logically deleted by stamping `deleted_at`; the row
    /// is NOT removed and stays visible to every read.
    pub async fn soft_delete(&self, db: &DatabaseConnection, id: i32) -> AppResult<bool> {
        let Some(model) = self.get(db, id).await? else {
            return Ok(false);
        };

        let now = time::now();
        let mut active = model.into_active_model();
        active.set_from_json(json!({ "deleted_at": now, "updated_at": now }))?;
        active.update(db).await?;
        Ok(true)
    }
}

/// Thin blocking adapter over [`Repo`] with identical semantics.
///
/// Each operation drives the async implementation to completion on the
/// controller's runtime; a non-blocking controller yields a usage error.
#[derive(Debug, Clone)]
pub struct BlockingRepo<A>
where
    A: ActiveModelTrait,
{
    inner: Repo<A>,
}

impl<A> Default for BlockingRepo<A>
where
    A: ActiveModelTrait,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> BlockingRepo<A>
where
    A: ActiveModelTrait,
{
    pub fn new() -> Self {
        Self::with_max_per_page(DEFAULT_MAX_PER_PAGE)
    }

    pub fn with_max_per_page(max_per_page: u64) -> Self {
        Self {
            inner: Repo::with_max_per_page(max_per_page),
        }
    }

    /// See [`Repo::paginate`].
    pub fn paginate(&self, page: u64, items_per_page: u64) -> (u64, u64) {
        self.inner.paginate(page, items_per_page)
    }
}

impl<A> BlockingRepo<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A> + for<'de> Deserialize<'de>,
    <<EntityOf<A> as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    pub fn list(
        &self,
        db: &Controller,
        page: u64,
        items_per_page: u64,
        conditions: Option<Condition>,
    ) -> AppResult<Vec<ModelOf<A>>> {
        db.block_on(self.inner.list(db.conn(), page, items_per_page, conditions))?
    }

    pub fn list_by(
        &self,
        db: &Controller,
        filters: &[(&str, Value)],
        page: u64,
        items_per_page: u64,
    ) -> AppResult<Vec<ModelOf<A>>> {
        db.block_on(self.inner.list_by(db.conn(), filters, page, items_per_page))?
    }

    pub fn get(&self, db: &Controller, id: i32) -> AppResult<Option<ModelOf<A>>> {
        db.block_on(self.inner.get(db.conn(), id))?
    }

    pub fn create(&self, db: &Controller, fields: serde_json::Value) -> AppResult<ModelOf<A>> {
        db.block_on(self.inner.create(db.conn(), fields))?
    }

    pub fn update(
        &self,
        db: &Controller,
        id: i32,
        fields: serde_json::Value,
    ) -> AppResult<Option<ModelOf<A>>> {
        db.block_on(self.inner.update(db.conn(), id, fields))?
    }

    pub fn delete(&self, db: &Controller, id: i32) -> AppResult<bool> {
        db.block_on(self.inner.delete(db.conn(), id))?
    }

    pub fn soft_delete(&self, db: &Controller, id: i32) -> AppResult<bool> {
        db.block_on(self.inner.soft_delete(db.conn(), id))?
    }
}

/// View a field map as a mutable JSON object, rejecting anything else.
fn object_fields(
    fields: &mut serde_json::Value,
) -> AppResult<&mut serde_json::Map<String, serde_json::Value>> {
    fields
        .as_object_mut()
        .ok_or_else(|| AppError::validation("field map must be a JSON object"))
}
