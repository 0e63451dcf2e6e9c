use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::{BikeController, ReportSessionController};
use crate::dto::{ApiResponse, BikeRequest, ReportTheftRequest, SessionResponse, SessionStepResponse};
use crate::models::{TheftReport, VehicleIdentity};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_reports_router() -> Router<AppState> {
    Router::new().route("/", get(list_active_reports))
}

pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/:id", get(get_session).delete(discard_session))
        .route("/:id/vehicle", post(submit_vehicle))
        .route("/:id/back", post(go_back))
        .route("/:id/theft", post(submit_theft))
}

async fn list_active_reports(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TheftReport>>>, AppError> {
    let controller = BikeController::new(state.store.clone());
    let response = controller.active_reports().await?;
    Ok(Json(response))
}

async fn start_session(State(state): State<AppState>) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.start().await?;
    Ok(Json(response))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.discard(id).await?;
    Ok(Json(response))
}

async fn submit_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BikeRequest>,
) -> Result<Json<ApiResponse<SessionStepResponse<VehicleIdentity>>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.submit_vehicle(id, request).await?;
    Ok(Json(response))
}

async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.go_back(id).await?;
    Ok(Json(response))
}

async fn submit_theft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReportTheftRequest>,
) -> Result<Json<ApiResponse<SessionStepResponse<TheftReport>>>, AppError> {
    let controller = ReportSessionController::new(state);
    let response = controller.submit_theft(id, request).await?;
    Ok(Json(response))
}
