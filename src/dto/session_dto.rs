use serde::Serialize;
use uuid::Uuid;

use crate::services::report_workflow::{WorkflowSnapshot, WorkflowState};

// Estado de una sesión de reporte
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub snapshot: WorkflowSnapshot,
}

// Resultado de un paso del flujo: el nuevo estado y lo que devolvió el store
#[derive(Debug, Serialize)]
pub struct SessionStepResponse<T> {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub result: T,
}
