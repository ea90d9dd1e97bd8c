//! Diesel schema for saga persistence.

diesel::table! {
    /// Opportunity saga instances.
    opportunities (id) {
        /// Instance identifier.
        id -> Uuid,
        /// Connector being asked.
        connector_id -> Uuid,
        /// Requesting member.
        requester_id -> Uuid,
        /// Prospect display name.
        #[max_length = 255]
        subject -> Varchar,
        /// Bounty in credit units.
        bounty -> Int8,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Expiry deadline.
        expires_at -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Connection-request saga instances.
    connection_requests (id) {
        /// Instance identifier.
        id -> Uuid,
        /// Member being asked for an introduction.
        target_id -> Uuid,
        /// Requesting third-party display name.
        #[max_length = 255]
        requester -> Varchar,
        /// Bounty in credit units.
        bounty -> Int8,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Expiry deadline.
        expires_at -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Offer saga instances.
    offers (id) {
        /// Instance identifier.
        id -> Uuid,
        /// Person offered the introduction.
        introducee_id -> Uuid,
        /// Facilitating connector.
        connector_id -> Uuid,
        /// Subject display name.
        #[max_length = 255]
        subject -> Varchar,
        /// Bounty in credit units.
        bounty -> Int8,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Introducee acceptance timestamp.
        accepted_at -> Nullable<Timestamptz>,
        /// Whether the single connector reminder is scheduled.
        reminder_scheduled -> Bool,
        /// Expiry deadline for the unanswered offer.
        expires_at -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}
