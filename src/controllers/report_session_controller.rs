//! Sesiones HTTP del flujo de registro + reporte
//!
//! Cada sesión guarda un `ReportWorkflow`. Solo un request a la vez puede
//! operar sobre ella; una violación de invariante la descarta y completar el
//! reporte la cierra.

use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, BikeRequest, ReportTheftRequest, SessionResponse, SessionStepResponse};
use crate::models::{TheftReport, VehicleIdentity};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct ReportSessionController {
    state: AppState,
}

impl ReportSessionController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn start(&self) -> Result<ApiResponse<SessionResponse>, AppError> {
        let (session_id, workflow) = self.state.open_session().await?;
        let snapshot = workflow.lock().await.snapshot();

        Ok(ApiResponse::success_with_message(
            SessionResponse { session_id, snapshot },
            "Report session started",
        ))
    }

    pub async fn get(&self, session_id: Uuid) -> Result<ApiResponse<SessionResponse>, AppError> {
        let workflow = self.state.lock_session(session_id).await?;
        Ok(ApiResponse::success(SessionResponse {
            session_id,
            snapshot: workflow.snapshot(),
        }))
    }

    pub async fn discard(&self, session_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if !self.state.close_session(session_id).await {
            return Err(not_found_error("Report session", &session_id.to_string()));
        }
        Ok(ApiResponse::message_only("Report session discarded"))
    }

    pub async fn submit_vehicle(
        &self,
        session_id: Uuid,
        request: BikeRequest,
    ) -> Result<ApiResponse<SessionStepResponse<VehicleIdentity>>, AppError> {
        let draft = request.validated()?;

        let mut workflow = self.state.lock_session(session_id).await?;
        let result = workflow.submit_vehicle_info(draft).await;
        let bike = self.settle(session_id, result).await?;

        Ok(ApiResponse::success_with_message(
            SessionStepResponse {
                session_id,
                state: workflow.state(),
                result: bike,
            },
            "Bike information saved",
        ))
    }

    pub async fn go_back(&self, session_id: Uuid) -> Result<ApiResponse<SessionResponse>, AppError> {
        let mut workflow = self.state.lock_session(session_id).await?;
        workflow.go_back()?;

        Ok(ApiResponse::success(SessionResponse {
            session_id,
            snapshot: workflow.snapshot(),
        }))
    }

    pub async fn submit_theft(
        &self,
        session_id: Uuid,
        request: ReportTheftRequest,
    ) -> Result<ApiResponse<SessionStepResponse<TheftReport>>, AppError> {
        request.validate()?;

        let mut workflow = self.state.lock_session(session_id).await?;
        let result = workflow.submit_theft_report(request.into_draft()).await;
        let report = self.settle(session_id, result).await?;

        // COMPLETE es terminal: no queda nada que hacer con la sesión
        self.state.close_session(session_id).await;
        info!("✅ Sesión {} completada", session_id);

        Ok(ApiResponse::success_with_message(
            SessionStepResponse {
                session_id,
                state: workflow.state(),
                result: report,
            },
            "Bike reported as stolen",
        ))
    }

    /// Un error irrecuperable invalida la sesión: se descarta y el cliente empieza otra
    async fn settle<T>(&self, session_id: Uuid, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            if !e.is_recoverable() {
                error!("💥 Sesión {} descartada: {}", session_id, e);
                self.state.close_session(session_id).await;
            }
        }
        result
    }
}
