//! User entity <-> model mapper

use pgr_core::{DomainError, User};

use crate::models::UserModel;

/// Convert UserModel to User entity
impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let access_level = model
            .access_level
            .parse()
            .map_err(|_| DomainError::InvalidAccessLevel(model.access_level.clone()))?;

        Ok(User {
            id: model.id,
            email: model.email,
            discord_user_id: model.discord_user_id,
            stripe_customer_id: model.stripe_customer_id,
            access_level,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
