//! Mapping from a payment provider subscription status to an access change

/// What a subscription status means for the owning user's access level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessEffect {
    /// The subscription is paid up; the user should be premium
    Grant,
    /// The subscription is over; the user should drop back to free
    Revoke,
    /// Transitional state (past_due, incomplete, paused, ...); mirror the status only
    RecordOnly,
}

impl AccessEffect {
    /// Classify a raw provider status string
    #[must_use]
    pub fn for_status(status: &str) -> Self {
        match status {
            "active" | "trialing" => Self::Grant,
            "canceled" | "unpaid" | "incomplete_expired" => Self::Revoke,
            _ => Self::RecordOnly,
        }
    }
}

/// Statuses a provider subscription never leaves
#[must_use]
pub fn is_final_status(status: &str) -> bool {
    matches!(status, "canceled" | "incomplete_expired")
}
