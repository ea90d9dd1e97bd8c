//! `PostgreSQL` repository implementations for the sagas.

use super::{
    models::{ConnectionRequestRow, OfferRow, OpportunityRow},
    schema::{connection_requests, offers, opportunities},
};
use crate::identity::UserId;
use crate::saga::{
    domain::{
        Bounty, ConnectionRequest, ConnectionRequestId, ConnectionRequestStatus, Offer, OfferId,
        OfferStatus, Opportunity, OpportunityId, OpportunityStatus,
        PersistedConnectionRequestData, PersistedOfferData, PersistedOpportunityData, SubjectName,
    },
    ports::{
        ConnectionRequestRepository, OfferRepository, OpportunityRepository, SagaRepositoryError,
        SagaRepositoryResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by saga adapters.
pub type SagaPgPool = Pool<ConnectionManager<PgConnection>>;

async fn run_blocking<F, T>(pool: &SagaPgPool, f: F) -> SagaRepositoryResult<T>
where
    F: FnOnce(&mut PgConnection) -> SagaRepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(SagaRepositoryError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(SagaRepositoryError::persistence)?
}

/// `PostgreSQL`-backed opportunity repository.
#[derive(Debug, Clone)]
pub struct PostgresOpportunityRepository {
    pool: SagaPgPool,
}

impl PostgresOpportunityRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SagaPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityRepository for PostgresOpportunityRepository {
    async fn store(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()> {
        let id = opportunity.id().into_inner();
        let row = opportunity_to_row(opportunity);

        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(opportunities::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SagaRepositoryError::DuplicateInstance(id)
                    }
                    _ => SagaRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()> {
        let id = opportunity.id().into_inner();
        let row = opportunity_to_row(opportunity);

        run_blocking(&self.pool, move |connection| {
            let updated =
                diesel::update(opportunities::table.filter(opportunities::id.eq(id)))
                    .set(&row)
                    .execute(connection)
                    .map_err(SagaRepositoryError::persistence)?;
            if updated == 0 {
                return Err(SagaRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: OpportunityId) -> SagaRepositoryResult<Option<Opportunity>> {
        run_blocking(&self.pool, move |connection| {
            let row = opportunities::table
                .filter(opportunities::id.eq(id.into_inner()))
                .select(OpportunityRow::as_select())
                .first::<OpportunityRow>(connection)
                .optional()
                .map_err(SagaRepositoryError::persistence)?;
            row.map(row_to_opportunity).transpose()
        })
        .await
    }

    async fn list_open_by_subject(
        &self,
        subject: &SubjectName,
    ) -> SagaRepositoryResult<Vec<Opportunity>> {
        let name = subject.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = opportunities::table
                .filter(opportunities::subject.eq(name))
                .filter(opportunities::status.eq(OpportunityStatus::Open.as_str()))
                .select(OpportunityRow::as_select())
                .load::<OpportunityRow>(connection)
                .map_err(SagaRepositoryError::persistence)?;
            rows.into_iter().map(row_to_opportunity).collect()
        })
        .await
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> SagaRepositoryResult<Vec<Opportunity>> {
        run_blocking(&self.pool, move |connection| {
            let rows = opportunities::table
                .filter(opportunities::expires_at.le(now))
                .filter(opportunities::status.eq_any([
                    OpportunityStatus::Open.as_str(),
                    OpportunityStatus::Accepted.as_str(),
                ]))
                .select(OpportunityRow::as_select())
                .load::<OpportunityRow>(connection)
                .map_err(SagaRepositoryError::persistence)?;
            rows.into_iter().map(row_to_opportunity).collect()
        })
        .await
    }
}

/// `PostgreSQL`-backed connection-request repository.
#[derive(Debug, Clone)]
pub struct PostgresConnectionRequestRepository {
    pool: SagaPgPool,
}

impl PostgresConnectionRequestRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SagaPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRequestRepository for PostgresConnectionRequestRepository {
    async fn store(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()> {
        let id = request.id().into_inner();
        let row = request_to_row(request);

        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(connection_requests::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SagaRepositoryError::DuplicateInstance(id)
                    }
                    _ => SagaRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()> {
        let id = request.id().into_inner();
        let row = request_to_row(request);

        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(
                connection_requests::table.filter(connection_requests::id.eq(id)),
            )
            .set(&row)
            .execute(connection)
            .map_err(SagaRepositoryError::persistence)?;
            if updated == 0 {
                return Err(SagaRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: ConnectionRequestId,
    ) -> SagaRepositoryResult<Option<ConnectionRequest>> {
        run_blocking(&self.pool, move |connection| {
            let row = connection_requests::table
                .filter(connection_requests::id.eq(id.into_inner()))
                .select(ConnectionRequestRow::as_select())
                .first::<ConnectionRequestRow>(connection)
                .optional()
                .map_err(SagaRepositoryError::persistence)?;
            row.map(row_to_request).transpose()
        })
        .await
    }

    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> SagaRepositoryResult<Vec<ConnectionRequest>> {
        run_blocking(&self.pool, move |connection| {
            let rows = connection_requests::table
                .filter(connection_requests::expires_at.le(now))
                .filter(connection_requests::status.eq_any([
                    ConnectionRequestStatus::Open.as_str(),
                    ConnectionRequestStatus::Accepted.as_str(),
                ]))
                .select(ConnectionRequestRow::as_select())
                .load::<ConnectionRequestRow>(connection)
                .map_err(SagaRepositoryError::persistence)?;
            rows.into_iter().map(row_to_request).collect()
        })
        .await
    }
}

/// `PostgreSQL`-backed offer repository.
#[derive(Debug, Clone)]
pub struct PostgresOfferRepository {
    pool: SagaPgPool,
}

impl PostgresOfferRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SagaPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn store(&self, offer: &Offer) -> SagaRepositoryResult<()> {
        let id = offer.id().into_inner();
        let row = offer_to_row(offer);

        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(offers::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SagaRepositoryError::DuplicateInstance(id)
                    }
                    _ => SagaRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, offer: &Offer) -> SagaRepositoryResult<()> {
        let id = offer.id().into_inner();
        let row = offer_to_row(offer);

        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(offers::table.filter(offers::id.eq(id)))
                .set(&row)
                .execute(connection)
                .map_err(SagaRepositoryError::persistence)?;
            if updated == 0 {
                return Err(SagaRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: OfferId) -> SagaRepositoryResult<Option<Offer>> {
        run_blocking(&self.pool, move |connection| {
            let row = offers::table
                .filter(offers::id.eq(id.into_inner()))
                .select(OfferRow::as_select())
                .first::<OfferRow>(connection)
                .optional()
                .map_err(SagaRepositoryError::persistence)?;
            row.map(row_to_offer).transpose()
        })
        .await
    }

    async fn list_by_status(&self, status: OfferStatus) -> SagaRepositoryResult<Vec<Offer>> {
        run_blocking(&self.pool, move |connection| {
            let rows = offers::table
                .filter(offers::status.eq(status.as_str()))
                .select(OfferRow::as_select())
                .load::<OfferRow>(connection)
                .map_err(SagaRepositoryError::persistence)?;
            rows.into_iter().map(row_to_offer).collect()
        })
        .await
    }
}

fn opportunity_to_row(opportunity: &Opportunity) -> OpportunityRow {
    OpportunityRow {
        id: opportunity.id().into_inner(),
        connector_id: opportunity.connector_id().into_inner(),
        requester_id: opportunity.requester_id().into_inner(),
        subject: opportunity.subject().as_str().to_owned(),
        bounty: opportunity.bounty().amount(),
        status: opportunity.status().as_str().to_owned(),
        expires_at: opportunity.expires_at(),
        created_at: opportunity.created_at(),
        updated_at: opportunity.updated_at(),
    }
}

fn row_to_opportunity(row: OpportunityRow) -> SagaRepositoryResult<Opportunity> {
    let subject = SubjectName::new(row.subject).map_err(SagaRepositoryError::persistence)?;
    let bounty = Bounty::new(row.bounty).map_err(SagaRepositoryError::persistence)?;
    let status = OpportunityStatus::try_from(row.status.as_str())
        .map_err(SagaRepositoryError::persistence)?;

    Ok(Opportunity::from_persisted(PersistedOpportunityData {
        id: OpportunityId::from_uuid(row.id),
        connector_id: UserId::from_uuid(row.connector_id),
        requester_id: UserId::from_uuid(row.requester_id),
        subject,
        bounty,
        status,
        expires_at: row.expires_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn request_to_row(request: &ConnectionRequest) -> ConnectionRequestRow {
    ConnectionRequestRow {
        id: request.id().into_inner(),
        target_id: request.target_id().into_inner(),
        requester: request.requester().as_str().to_owned(),
        bounty: request.bounty().amount(),
        status: request.status().as_str().to_owned(),
        expires_at: request.expires_at(),
        created_at: request.created_at(),
        updated_at: request.updated_at(),
    }
}

fn row_to_request(row: ConnectionRequestRow) -> SagaRepositoryResult<ConnectionRequest> {
    let requester = SubjectName::new(row.requester).map_err(SagaRepositoryError::persistence)?;
    let bounty = Bounty::new(row.bounty).map_err(SagaRepositoryError::persistence)?;
    let status = ConnectionRequestStatus::try_from(row.status.as_str())
        .map_err(SagaRepositoryError::persistence)?;

    Ok(ConnectionRequest::from_persisted(
        PersistedConnectionRequestData {
            id: ConnectionRequestId::from_uuid(row.id),
            target_id: UserId::from_uuid(row.target_id),
            requester,
            bounty,
            status,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
    ))
}

fn offer_to_row(offer: &Offer) -> OfferRow {
    OfferRow {
        id: offer.id().into_inner(),
        introducee_id: offer.introducee_id().into_inner(),
        connector_id: offer.connector_id().into_inner(),
        subject: offer.subject().as_str().to_owned(),
        bounty: offer.bounty().amount(),
        status: offer.status().as_str().to_owned(),
        accepted_at: offer.accepted_at(),
        reminder_scheduled: offer.reminder_scheduled(),
        expires_at: offer.expires_at(),
        created_at: offer.created_at(),
        updated_at: offer.updated_at(),
    }
}

fn row_to_offer(row: OfferRow) -> SagaRepositoryResult<Offer> {
    let subject = SubjectName::new(row.subject).map_err(SagaRepositoryError::persistence)?;
    let bounty = Bounty::new(row.bounty).map_err(SagaRepositoryError::persistence)?;
    let status =
        OfferStatus::try_from(row.status.as_str()).map_err(SagaRepositoryError::persistence)?;

    Ok(Offer::from_persisted(PersistedOfferData {
        id: OfferId::from_uuid(row.id),
        introducee_id: UserId::from_uuid(row.introducee_id),
        connector_id: UserId::from_uuid(row.connector_id),
        subject,
        bounty,
        status,
        accepted_at: row.accepted_at,
        reminder_scheduled: row.reminder_scheduled,
        expires_at: row.expires_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
