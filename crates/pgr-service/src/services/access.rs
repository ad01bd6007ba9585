//! Access status for the signed-in user

use tracing::instrument;

use pgr_core::User;

use crate::dto::AccessStatusResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct AccessService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AccessService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Access level plus the most recent subscription mirror, if any
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn status(&self, user: &User) -> ServiceResult<AccessStatusResponse> {
        let subscription = self
            .ctx
            .subscription_repo()
            .find_latest_for_user(user.id)
            .await?;
        Ok(AccessStatusResponse::new(user, subscription.as_ref()))
    }
}
