//! `PostgreSQL` repository implementation for the credit ledger.

use super::{
    models::{BalanceQueryRow, BalanceRow, CreditEventRow, NewCreditEventRow},
    schema::{credit_balances, credit_events},
};
use crate::credit::{
    domain::{
        CreditAmount, CreditEvent, CreditEventType, CreditReferenceType, CreditEventId,
        IdempotencyKey, PersistedCreditEventData,
    },
    ports::{CreditBalance, CreditLedgerRepository, CreditLedgerRepositoryError, CreditLedgerResult},
};
use crate::identity::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by credit adapters.
pub type CreditPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed credit ledger repository.
#[derive(Debug, Clone)]
pub struct PostgresCreditLedger {
    pool: CreditPgPool,
}

impl PostgresCreditLedger {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: CreditPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> CreditLedgerResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CreditLedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CreditLedgerRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(CreditLedgerRepositoryError::persistence)?
    }
}

#[async_trait]
impl CreditLedgerRepository for PostgresCreditLedger {
    async fn append(&self, event: &CreditEvent) -> CreditLedgerResult<()> {
        let new_row = to_new_row(event);
        let key = event.idempotency_key().clone();

        self.run_blocking(move |connection| {
            diesel::insert_into(credit_events::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        CreditLedgerRepositoryError::DuplicateKey(key.clone())
                    }
                    _ => CreditLedgerRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_key(&self, key: &IdempotencyKey) -> CreditLedgerResult<Option<CreditEvent>> {
        let lookup = key.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = credit_events::table
                .filter(credit_events::idempotency_key.eq(lookup))
                .select(CreditEventRow::as_select())
                .first::<CreditEventRow>(connection)
                .optional()
                .map_err(CreditLedgerRepositoryError::persistence)?;
            row.map(row_to_event).transpose()
        })
        .await
    }

    async fn list_for_user(&self, user_id: UserId) -> CreditLedgerResult<Vec<CreditEvent>> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = credit_events::table
                .filter(credit_events::user_id.eq(account))
                .order(credit_events::created_at.asc())
                .select(CreditEventRow::as_select())
                .load::<CreditEventRow>(connection)
                .map_err(CreditLedgerRepositoryError::persistence)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn recompute_balance(
        &self,
        user_id: UserId,
        computed_at: DateTime<Utc>,
    ) -> CreditLedgerResult<CreditBalance> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let total: Option<i64> = credit_events::table
                .filter(credit_events::user_id.eq(account))
                .filter(credit_events::processed.eq(true))
                .select(diesel::dsl::sum(credit_events::amount))
                .first(connection)
                .map_err(CreditLedgerRepositoryError::persistence)?;
            let balance = total.unwrap_or(0);

            let row = BalanceRow {
                user_id: account,
                balance,
                computed_at,
            };
            diesel::insert_into(credit_balances::table)
                .values(&row)
                .on_conflict(credit_balances::user_id)
                .do_update()
                .set((
                    credit_balances::balance.eq(balance),
                    credit_balances::computed_at.eq(computed_at),
                ))
                .execute(connection)
                .map_err(CreditLedgerRepositoryError::persistence)?;

            Ok(CreditBalance {
                user_id,
                balance,
                computed_at,
            })
        })
        .await
    }

    async fn balance(&self, user_id: UserId) -> CreditLedgerResult<Option<CreditBalance>> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let row = credit_balances::table
                .filter(credit_balances::user_id.eq(account))
                .select(BalanceQueryRow::as_select())
                .first::<BalanceQueryRow>(connection)
                .optional()
                .map_err(CreditLedgerRepositoryError::persistence)?;
            Ok(row.map(|snapshot| CreditBalance {
                user_id: UserId::from_uuid(snapshot.user_id),
                balance: snapshot.balance,
                computed_at: snapshot.computed_at,
            }))
        })
        .await
    }
}

fn row_to_event(row: CreditEventRow) -> CreditLedgerResult<CreditEvent> {
    let event_type = CreditEventType::try_from(row.event_type.as_str())
        .map_err(CreditLedgerRepositoryError::persistence)?;
    let reference_type = CreditReferenceType::try_from(row.reference_type.as_str())
        .map_err(CreditLedgerRepositoryError::persistence)?;
    let amount =
        CreditAmount::new(row.amount).map_err(CreditLedgerRepositoryError::persistence)?;

    Ok(CreditEvent::from_persisted(PersistedCreditEventData {
        id: CreditEventId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        event_type,
        amount,
        reference_type,
        reference_id: row.reference_id,
        idempotency_key: IdempotencyKey::from_persisted(row.idempotency_key),
        processed: row.processed,
        created_at: row.created_at,
    }))
}

fn to_new_row(event: &CreditEvent) -> NewCreditEventRow {
    NewCreditEventRow {
        id: event.id().into_inner(),
        user_id: event.user_id().into_inner(),
        event_type: event.event_type().as_str().to_owned(),
        amount: event.amount().value(),
        reference_type: event.reference_type().as_str().to_owned(),
        reference_id: event.reference_id(),
        idempotency_key: event.idempotency_key().as_str().to_owned(),
        processed: event.processed(),
        created_at: event.created_at(),
    }
}
