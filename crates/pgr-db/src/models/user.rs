//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: Uuid,
    pub email: String,
    pub discord_user_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    /// `free` or `premium` (enforced by a CHECK constraint)
    pub access_level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
