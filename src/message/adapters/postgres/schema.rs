//! Diesel schema for message orchestrator persistence.

diesel::table! {
    /// Outbound queued messages.
    queued_messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Recipient.
        user_id -> Uuid,
        /// Composing agent kind.
        #[max_length = 100]
        source_agent -> Varchar,
        /// Content payload, serialized.
        content -> Jsonb,
        /// Rendered text, when recorded.
        final_text -> Nullable<Text>,
        /// Earliest dispatch time.
        scheduled_for -> Timestamptz,
        /// Priority rank; lower dispatches first.
        priority -> Int2,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Superseding message, when replaced.
        superseded_by -> Nullable<Uuid>,
        /// Supersession or cancellation reason.
        status_reason -> Nullable<Text>,
        /// Sequence the message belongs to, when any.
        sequence_id -> Nullable<Uuid>,
        /// One-based position inside the sequence.
        sequence_position -> Nullable<Int4>,
        /// Total sequence members.
        sequence_total -> Nullable<Int4>,
        /// Kind of the referenced entity, when any.
        #[max_length = 50]
        context_type -> Nullable<Varchar>,
        /// Identifier of the referenced entity, when any.
        context_id -> Nullable<Uuid>,
        /// Whether content re-renders immediately before send.
        requires_fresh_context -> Bool,
        /// Delivery timestamp, when sent.
        sent_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}
