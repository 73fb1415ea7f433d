//! Admin API endpoints
//!
//! All routes require an admin identity.

use axum::{Router, extract::State, response::Json, routing::get};

use super::dto::ApiResponse;
use crate::AppState;
use crate::auth::{AdminIdentity, Capability};
use crate::data::DashboardCounts;
use crate::error::AppError;

/// Create admin router
///
/// Routes:
/// - GET /admin/dashboard - Aggregate platform counts
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(dashboard))
}

/// GET /admin/dashboard
async fn dashboard(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
) -> Result<Json<ApiResponse<DashboardCounts>>, AppError> {
    admin.require(Capability::ViewDashboard)?;

    let counts = state.db.dashboard_counts().await?;
    tracing::debug!(requested_by = %admin.id, "Dashboard counts loaded");

    Ok(Json(ApiResponse::ok(counts)))
}
