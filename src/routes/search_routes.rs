use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::BikeController;
use crate::dto::{SearchBikesParams, SearchResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_search_router() -> Router<AppState> {
    Router::new().route("/bikes", get(search_bikes))
}

async fn search_bikes(
    State(state): State<AppState>,
    Query(params): Query<SearchBikesParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.search(params).await?;
    Ok(Json(response))
}
