//! Diesel schema for event log persistence.

diesel::table! {
    /// Append-only event records.
    events (id) {
        /// Event identifier.
        id -> Uuid,
        /// Event type tag.
        #[max_length = 100]
        event_type -> Varchar,
        /// Aggregate the event belongs to.
        aggregate_id -> Uuid,
        /// Kind of the aggregate.
        #[max_length = 50]
        aggregate_type -> Varchar,
        /// Typed payload, serialized.
        payload -> Jsonb,
        /// Structured metadata, serialized.
        metadata -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Producer agent kind.
        #[max_length = 100]
        created_by -> Varchar,
    }
}

diesel::table! {
    /// Parked events and tasks that exhausted retries.
    dead_letters (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Source kind tag.
        #[max_length = 20]
        kind -> Varchar,
        /// Identifier of the parked event or task.
        reference_id -> Uuid,
        /// Serialized payload at parking time.
        payload -> Jsonb,
        /// Error history, serialized as a JSON array.
        error_log -> Jsonb,
        /// Attempt count at parking time.
        attempts -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
