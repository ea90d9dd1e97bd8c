//! `PostgreSQL` repository implementations for the event log.

use super::{
    models::{DeadLetterRow, EventRow, NewDeadLetterRow, NewEventRow},
    schema::{dead_letters, events},
};
use crate::event_log::{
    domain::{
        AggregateType, DeadLetter, DeadLetterId, DeadLetterKind, Event, EventId, EventMetadata,
        EventPayload, PersistedDeadLetterData, PersistedEventData,
    },
    ports::{
        DeadLetterRepository, EventLogRepositoryError, EventLogResult, EventRepository,
    },
};
use crate::identity::AgentKind;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by event log adapters.
pub type EventLogPgPool = Pool<ConnectionManager<PgConnection>>;

async fn run_blocking<F, T>(pool: &EventLogPgPool, f: F) -> EventLogResult<T>
where
    F: FnOnce(&mut PgConnection) -> EventLogResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(EventLogRepositoryError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(EventLogRepositoryError::persistence)?
}

/// `PostgreSQL`-backed event repository.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: EventLogPgPool,
}

impl PostgresEventStore {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EventLogPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventStore {
    async fn append(&self, event: &Event) -> EventLogResult<()> {
        let id = event.id();
        let new_row = event_to_row(event)?;

        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(events::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        EventLogRepositoryError::DuplicateEvent(id)
                    }
                    _ => EventLogRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<Event>> {
        run_blocking(&self.pool, move |connection| {
            let row = events::table
                .filter(events::id.eq(id.into_inner()))
                .select(EventRow::as_select())
                .first::<EventRow>(connection)
                .optional()
                .map_err(EventLogRepositoryError::persistence)?;
            row.map(row_to_event).transpose()
        })
        .await
    }

    async fn list_for_aggregate(&self, aggregate_id: Uuid) -> EventLogResult<Vec<Event>> {
        run_blocking(&self.pool, move |connection| {
            let rows = events::table
                .filter(events::aggregate_id.eq(aggregate_id))
                .order(events::created_at.asc())
                .select(EventRow::as_select())
                .load::<EventRow>(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }
}

/// `PostgreSQL`-backed dead-letter repository.
#[derive(Debug, Clone)]
pub struct PostgresDeadLetterStore {
    pool: EventLogPgPool,
}

impl PostgresDeadLetterStore {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EventLogPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadLetterRepository for PostgresDeadLetterStore {
    async fn store(&self, letter: &DeadLetter) -> EventLogResult<()> {
        let new_row = letter_to_row(letter)?;

        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(dead_letters::table)
                .values(&new_row)
                .execute(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: DeadLetterId) -> EventLogResult<Option<DeadLetter>> {
        run_blocking(&self.pool, move |connection| {
            let row = dead_letters::table
                .filter(dead_letters::id.eq(id.into_inner()))
                .select(DeadLetterRow::as_select())
                .first::<DeadLetterRow>(connection)
                .optional()
                .map_err(EventLogRepositoryError::persistence)?;
            row.map(row_to_letter).transpose()
        })
        .await
    }

    async fn list(&self, limit: u32) -> EventLogResult<Vec<DeadLetter>> {
        run_blocking(&self.pool, move |connection| {
            let rows = dead_letters::table
                .order(dead_letters::created_at.asc())
                .limit(i64::from(limit))
                .select(DeadLetterRow::as_select())
                .load::<DeadLetterRow>(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            rows.into_iter().map(row_to_letter).collect()
        })
        .await
    }

    async fn remove(&self, id: DeadLetterId) -> EventLogResult<()> {
        run_blocking(&self.pool, move |connection| {
            let removed =
                diesel::delete(dead_letters::table.filter(dead_letters::id.eq(id.into_inner())))
                    .execute(connection)
                    .map_err(EventLogRepositoryError::persistence)?;
            if removed == 0 {
                return Err(EventLogRepositoryError::DeadLetterNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn event_to_row(event: &Event) -> EventLogResult<NewEventRow> {
    let payload =
        serde_json::to_value(event.payload()).map_err(EventLogRepositoryError::persistence)?;
    let metadata =
        serde_json::to_value(event.metadata()).map_err(EventLogRepositoryError::persistence)?;

    Ok(NewEventRow {
        id: event.id().into_inner(),
        event_type: event.event_type().to_owned(),
        aggregate_id: event.aggregate_id(),
        aggregate_type: event.aggregate_type().as_str().to_owned(),
        payload,
        metadata,
        created_at: event.created_at(),
        created_by: event.created_by().as_str().to_owned(),
    })
}

fn row_to_event(row: EventRow) -> EventLogResult<Event> {
    let payload: EventPayload =
        serde_json::from_value(row.payload).map_err(EventLogRepositoryError::persistence)?;
    let metadata: EventMetadata =
        serde_json::from_value(row.metadata).map_err(EventLogRepositoryError::persistence)?;
    let aggregate_type = AggregateType::try_from(row.aggregate_type.as_str())
        .map_err(EventLogRepositoryError::persistence)?;
    let created_by =
        AgentKind::new(row.created_by).map_err(EventLogRepositoryError::persistence)?;

    Ok(Event::from_persisted(PersistedEventData {
        id: EventId::from_uuid(row.id),
        payload,
        aggregate_id: row.aggregate_id,
        aggregate_type,
        metadata,
        created_at: row.created_at,
        created_by,
    }))
}

fn letter_to_row(letter: &DeadLetter) -> EventLogResult<NewDeadLetterRow> {
    let error_log =
        serde_json::to_value(letter.error_log()).map_err(EventLogRepositoryError::persistence)?;
    let attempts =
        i32::try_from(letter.attempts()).map_err(EventLogRepositoryError::persistence)?;

    Ok(NewDeadLetterRow {
        id: letter.id().into_inner(),
        kind: letter.kind().as_str().to_owned(),
        reference_id: letter.kind().reference_id(),
        payload: letter.payload().clone(),
        error_log,
        attempts,
        created_at: letter.created_at(),
    })
}

fn row_to_letter(row: DeadLetterRow) -> EventLogResult<DeadLetter> {
    let kind = DeadLetterKind::from_parts(row.kind.as_str(), row.reference_id)
        .map_err(EventLogRepositoryError::persistence)?;
    let error_log: Vec<String> =
        serde_json::from_value(row.error_log).map_err(EventLogRepositoryError::persistence)?;
    let attempts = u32::try_from(row.attempts).map_err(EventLogRepositoryError::persistence)?;

    Ok(DeadLetter::from_persisted(PersistedDeadLetterData {
        id: DeadLetterId::from_uuid(row.id),
        kind,
        payload: row.payload,
        error_log,
        attempts,
        created_at: row.created_at,
    }))
}
