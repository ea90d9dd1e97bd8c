//! Diesel schema for priority ledger persistence.

diesel::table! {
    /// Ranked per-user actionable items.
    priority_items (id) {
        /// Item identifier.
        id -> Uuid,
        /// User whose queue the item belongs to.
        user_id -> Uuid,
        /// Referenced entity kind.
        #[max_length = 50]
        item_type -> Varchar,
        /// Referenced entity identifier.
        item_id -> Uuid,
        /// Rank position (1 is highest; 0 is unranked).
        rank -> Int4,
        /// Value score in `0..=100`.
        value_score -> Int2,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Number of presentations so far.
        presentation_count -> Int4,
        /// When the item was last surfaced.
        last_presented_at -> Nullable<Timestamptz>,
        /// When the item went dormant.
        dormant_at -> Nullable<Timestamptz>,
        /// Denormalized summary payload.
        summary -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
