use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::identity::CurrentUser;
use crate::routes::AppState;
use crate::services::analytics::{self, CategoryCount, DashboardTotals, MonthlyRevenue};
use crate::utils::error::AppError;
use crate::utils::response::success;

const REVENUE_MONTHS: usize = 6;

#[derive(Serialize)]
struct DashboardPayload {
    #[serde(flatten)]
    totals: DashboardTotals,
    monthly_revenue: Vec<MonthlyRevenue>,
    category_counts: Vec<CategoryCount>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    user.require_staff()?;

    let totals = analytics::dashboard_totals(&state.pool).await?;
    let monthly_revenue = analytics::revenue_by_month(&state.pool, REVENUE_MONTHS).await?;
    let category_counts = analytics::event_count_by_category(&state.pool).await?;

    let payload = DashboardPayload {
        totals,
        monthly_revenue,
        category_counts,
    };

    Ok(success(payload, "Dashboard retrieved").into_response())
}
