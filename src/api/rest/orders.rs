use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use super::ws;
use crate::error::AppError;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/events", get(ws::ws_handler))
        .route("/orders/:id", get(get_order))
}

#[derive(Deserialize)]
pub struct RecentOrdersQuery {
    pub user_id: i64,
    pub limit: Option<usize>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let limit = query.limit.unwrap_or(state.recent_orders_limit);
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be > 0".to_string()));
    }

    let orders = state.store.list_recent(query.user_id, limit).await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order))
}
