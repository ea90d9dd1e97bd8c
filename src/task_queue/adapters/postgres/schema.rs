//! Diesel schema for task queue persistence.

diesel::table! {
    /// Leased background tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task type tag.
        #[max_length = 100]
        task_type -> Varchar,
        /// Owning worker type.
        #[max_length = 100]
        agent_type -> Varchar,
        /// Member the task concerns, when any.
        user_id -> Nullable<Uuid>,
        /// Kind of the referenced entity, when any.
        #[max_length = 50]
        context_type -> Nullable<Varchar>,
        /// Identifier of the referenced entity, when any.
        context_id -> Nullable<Uuid>,
        /// Earliest dispatch time.
        scheduled_for -> Timestamptz,
        /// Priority rank; lower dispatches first.
        priority -> Int2,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Attempt count so far.
        retry_count -> Int4,
        /// Retry ceiling.
        max_retries -> Int4,
        /// Typed payload, serialized.
        payload -> Jsonb,
        /// Result payload, when completed.
        result_payload -> Nullable<Jsonb>,
        /// Error history, serialized as a JSON array.
        error_log -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}
