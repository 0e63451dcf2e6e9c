//! Services module
//!
//! Este módulo contiene la lógica de negocio: el flujo de registro/reporte
//! de robo y el servicio de búsqueda. Ambos hablan con el mismo `VehicleStore`.

pub mod report_workflow;
pub mod search_service;

pub use report_workflow::{ReportWorkflow, WorkflowSnapshot, WorkflowState};
pub use search_service::SearchService;
