//! `PostgreSQL` repository implementation for the priority ledger.

use super::{
    models::{NewPriorityItemRow, PriorityItemRow},
    schema::priority_items,
};
use crate::identity::UserId;
use crate::priority::{
    domain::{
        ItemSummary, PersistedPriorityItemData, PriorityItem, PriorityItemId, PriorityItemType,
        PriorityKey, PriorityStatus, Score,
    },
    ports::{PriorityRepository, PriorityRepositoryError, PriorityRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by priority adapters.
pub type PriorityPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed priority repository.
#[derive(Debug, Clone)]
pub struct PostgresPriorityRepository {
    pool: PriorityPgPool,
}

impl PostgresPriorityRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PriorityPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> PriorityRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> PriorityRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(PriorityRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(PriorityRepositoryError::persistence)?
    }
}

#[async_trait]
impl PriorityRepository for PostgresPriorityRepository {
    async fn insert(&self, item: &PriorityItem) -> PriorityRepositoryResult<()> {
        let key = item.key();
        let new_row = to_row(item)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(priority_items::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PriorityRepositoryError::DuplicateKey(key)
                    }
                    _ => PriorityRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, item: &PriorityItem) -> PriorityRepositoryResult<()> {
        let id = item.id();
        let changes = to_row(item)?;

        self.run_blocking(move |connection| {
            let updated =
                diesel::update(priority_items::table.filter(priority_items::id.eq(id.into_inner())))
                    .set(&changes)
                    .execute(connection)
                    .map_err(PriorityRepositoryError::persistence)?;
            if updated == 0 {
                return Err(PriorityRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: PriorityItemId,
    ) -> PriorityRepositoryResult<Option<PriorityItem>> {
        self.run_blocking(move |connection| {
            let row = priority_items::table
                .filter(priority_items::id.eq(id.into_inner()))
                .select(PriorityItemRow::as_select())
                .first::<PriorityItemRow>(connection)
                .optional()
                .map_err(PriorityRepositoryError::persistence)?;
            row.map(row_to_item).transpose()
        })
        .await
    }

    async fn find_by_key(
        &self,
        key: &PriorityKey,
    ) -> PriorityRepositoryResult<Option<PriorityItem>> {
        let lookup = *key;
        self.run_blocking(move |connection| {
            let row = priority_items::table
                .filter(priority_items::user_id.eq(lookup.user_id.into_inner()))
                .filter(priority_items::item_type.eq(lookup.item_type.as_str()))
                .filter(priority_items::item_id.eq(lookup.item_id))
                .select(PriorityItemRow::as_select())
                .first::<PriorityItemRow>(connection)
                .optional()
                .map_err(PriorityRepositoryError::persistence)?;
            row.map(row_to_item).transpose()
        })
        .await
    }

    async fn list_surfaceable_for_user(
        &self,
        user_id: UserId,
    ) -> PriorityRepositoryResult<Vec<PriorityItem>> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = priority_items::table
                .filter(priority_items::user_id.eq(account))
                .filter(priority_items::status.eq_any([
                    PriorityStatus::Active.as_str(),
                    PriorityStatus::Presented.as_str(),
                ]))
                .order((
                    priority_items::value_score.desc(),
                    priority_items::created_at.asc(),
                ))
                .select(PriorityItemRow::as_select())
                .load::<PriorityItemRow>(connection)
                .map_err(PriorityRepositoryError::persistence)?;
            rows.into_iter().map(row_to_item).collect()
        })
        .await
    }
}

fn to_row(item: &PriorityItem) -> PriorityRepositoryResult<NewPriorityItemRow> {
    let summary =
        serde_json::to_value(item.summary()).map_err(PriorityRepositoryError::persistence)?;
    let rank = i32::try_from(item.rank()).map_err(PriorityRepositoryError::persistence)?;
    let presentation_count =
        i32::try_from(item.presentation_count()).map_err(PriorityRepositoryError::persistence)?;

    Ok(NewPriorityItemRow {
        id: item.id().into_inner(),
        user_id: item.user_id().into_inner(),
        item_type: item.key().item_type.as_str().to_owned(),
        item_id: item.key().item_id,
        rank,
        value_score: item.value_score().value(),
        status: item.status().as_str().to_owned(),
        presentation_count,
        last_presented_at: item.last_presented_at(),
        dormant_at: item.dormant_at(),
        summary,
        created_at: item.created_at(),
        updated_at: item.updated_at(),
    })
}

fn row_to_item(row: PriorityItemRow) -> PriorityRepositoryResult<PriorityItem> {
    let item_type = PriorityItemType::try_from(row.item_type.as_str())
        .map_err(PriorityRepositoryError::persistence)?;
    let status = PriorityStatus::try_from(row.status.as_str())
        .map_err(PriorityRepositoryError::persistence)?;
    let summary: ItemSummary =
        serde_json::from_value(row.summary).map_err(PriorityRepositoryError::persistence)?;
    let rank = u32::try_from(row.rank).map_err(PriorityRepositoryError::persistence)?;
    let presentation_count =
        u32::try_from(row.presentation_count).map_err(PriorityRepositoryError::persistence)?;

    Ok(PriorityItem::from_persisted(PersistedPriorityItemData {
        id: PriorityItemId::from_uuid(row.id),
        key: PriorityKey {
            user_id: UserId::from_uuid(row.user_id),
            item_type,
            item_id: row.item_id,
        },
        rank,
        value_score: Score::from_persisted(row.value_score),
        status,
        presentation_count,
        last_presented_at: row.last_presented_at,
        dormant_at: row.dormant_at,
        summary,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
