use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::BikeController;
use crate::dto::{ApiResponse, BikeRequest, ReportTheftRequest};
use crate::models::{TheftReport, VehicleIdentity};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_bike_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_bike))
        .route("/:id", get(get_bike).put(update_bike))
        .route("/:id/report_stolen", post(report_stolen))
}

async fn create_bike(
    State(state): State<AppState>,
    Json(request): Json<BikeRequest>,
) -> Result<Json<ApiResponse<VehicleIdentity>>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_bike(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleIdentity>>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_bike(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BikeRequest>,
) -> Result<Json<ApiResponse<VehicleIdentity>>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn report_stolen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReportTheftRequest>,
) -> Result<Json<ApiResponse<TheftReport>>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.report_stolen(id, request).await?;
    Ok(Json(response))
}
