//! Health check

use tracing::warn;

use crate::dto::HealthResponse;

use super::context::ServiceContext;

pub struct HealthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> HealthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Probe the database; never fails, reports `degraded` instead
    pub async fn check(&self) -> HealthResponse {
        match self.ctx.health_probe().ping().await {
            Ok(()) => HealthResponse::from_db(true),
            Err(e) => {
                warn!(error = %e, "Database health probe failed");
                HealthResponse::from_db(false)
            }
        }
    }
}
