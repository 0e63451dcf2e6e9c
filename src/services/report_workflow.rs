//! Flujo de registro y reporte de robo
//!
//! Máquina de estados de dos pasos por sesión:
//!
//! ```text
//! COLLECTING_VEHICLE_INFO --submit_vehicle_info--> COLLECTING_THEFT_INFO
//! COLLECTING_THEFT_INFO   --go_back--------------> COLLECTING_VEHICLE_INFO
//! COLLECTING_THEFT_INFO   --submit_theft_report--> COMPLETE
//! ```
//!
//! Cualquier otra llamada falla con `AppError::InvalidTransition`. El flujo no
//! reintenta nada ni toma locks: el que llama serializa sus envíos.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{TheftReport, TheftReportDraft, VehicleDraft, VehicleIdentity};
use crate::repositories::VehicleStore;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    CollectingVehicleInfo,
    CollectingTheftInfo,
    Complete,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::CollectingVehicleInfo => f.write_str("COLLECTING_VEHICLE_INFO"),
            WorkflowState::CollectingTheftInfo => f.write_str("COLLECTING_THEFT_INFO"),
            WorkflowState::Complete => f.write_str("COMPLETE"),
        }
    }
}

/// Vista serializable del flujo
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub vehicle_id: Option<Uuid>,
    pub vehicle: Option<VehicleDraft>,
    pub report: Option<TheftReport>,
}

pub struct ReportWorkflow {
    store: Arc<dyn VehicleStore>,
    state: WorkflowState,
    vehicle: Option<VehicleDraft>,
    // Se conserva al volver atrás: el siguiente envío es un update
    vehicle_id: Option<Uuid>,
    report: Option<TheftReport>,
}

impl ReportWorkflow {
    pub fn new(store: Arc<dyn VehicleStore>) -> Self {
        Self {
            store,
            state: WorkflowState::CollectingVehicleInfo,
            vehicle: None,
            vehicle_id: None,
            report: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn vehicle_id(&self) -> Option<Uuid> {
        self.vehicle_id
    }

    pub fn vehicle(&self) -> Option<&VehicleDraft> {
        self.vehicle.as_ref()
    }

    pub fn report(&self) -> Option<&TheftReport> {
        self.report.as_ref()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            state: self.state,
            vehicle_id: self.vehicle_id,
            vehicle: self.vehicle.clone(),
            report: self.report.clone(),
        }
    }

    fn expect_state(&self, expected: WorkflowState, operation: &'static str) -> AppResult<()> {
        if self.state != expected {
            warn!("⛔ '{}' rechazado en estado {}", operation, self.state);
            return Err(AppError::InvalidTransition {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Paso 1: crea la moto (o la actualiza si ya tenía id tras `go_back`).
    /// Si el store falla, el estado no cambia y el error sale tal cual.
    pub async fn submit_vehicle_info(&mut self, draft: VehicleDraft) -> AppResult<VehicleIdentity> {
        self.expect_state(WorkflowState::CollectingVehicleInfo, "submit vehicle info")?;

        let draft = draft.normalized();
        draft.check_required()?;

        let vehicle = match self.vehicle_id {
            Some(id) => {
                info!("✏️ Actualizando moto {} (VIN {})", id, draft.vin);
                self.store.update_vehicle(id, &draft).await?
            }
            None => {
                info!("🏍️ Registrando moto VIN {}", draft.vin);
                self.store.create_vehicle(&draft).await?
            }
        };

        self.vehicle_id = Some(vehicle.id);
        self.vehicle = Some(draft);
        self.state = WorkflowState::CollectingTheftInfo;
        info!("✅ Moto {} guardada, esperando datos del robo", vehicle.id);

        Ok(vehicle)
    }

    /// Vuelve al paso 1 sin perder el borrador ni el id asignado
    pub fn go_back(&mut self) -> AppResult<()> {
        self.expect_state(WorkflowState::CollectingTheftInfo, "go back")?;
        self.state = WorkflowState::CollectingVehicleInfo;
        Ok(())
    }

    /// Paso 2: adjunta el reporte de robo a la moto ya persistida
    pub async fn submit_theft_report(&mut self, draft: TheftReportDraft) -> AppResult<TheftReport> {
        self.expect_state(WorkflowState::CollectingTheftInfo, "submit theft report")?;

        let vehicle_id = self.vehicle_id.ok_or_else(|| {
            error!("💥 Flujo en {} sin id de moto", self.state);
            AppError::InvariantViolation("theft report step reached without a vehicle id".to_string())
        })?;

        let draft = draft.normalized();
        draft.check_required()?;

        let report = match self.store.attach_theft_report(vehicle_id, &draft).await {
            Ok(report) => report,
            Err(AppError::NotFound(msg)) => {
                error!("💥 La moto {} desapareció entre pasos: {}", vehicle_id, msg);
                return Err(AppError::InvariantViolation(format!(
                    "vehicle {} vanished before its theft report was attached",
                    vehicle_id
                )));
            }
            Err(e) => return Err(e),
        };

        self.report = Some(report.clone());
        self.state = WorkflowState::Complete;
        info!("🚨 Moto {} reportada como robada", vehicle_id);

        Ok(report)
    }
}
