//! Diesel schema for credit ledger persistence.

diesel::table! {
    /// Append-only ledger lines.
    credit_events (id) {
        /// Ledger line identifier.
        id -> Uuid,
        /// Account the line belongs to.
        user_id -> Uuid,
        /// Event classification tag.
        #[max_length = 50]
        event_type -> Varchar,
        /// Signed amount in credit units.
        amount -> Int8,
        /// Referenced entity kind.
        #[max_length = 50]
        reference_type -> Varchar,
        /// Referenced entity identifier.
        reference_id -> Uuid,
        /// Deterministic idempotency key (unique).
        #[max_length = 64]
        idempotency_key -> Varchar,
        /// Whether the line counts toward the cached balance.
        processed -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cached per-user balance snapshots.
    credit_balances (user_id) {
        /// Account the snapshot belongs to.
        user_id -> Uuid,
        /// Sum of processed line amounts.
        balance -> Int8,
        /// When the snapshot was recomputed.
        computed_at -> Timestamptz,
    }
}
