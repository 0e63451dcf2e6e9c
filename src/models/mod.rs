//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio compartidos por el flujo
//! de registro/reporte y por el servicio de búsqueda.

pub mod search;
pub mod theft_report;
pub mod vehicle;

pub use search::{PageRequest, SearchAttribute, SearchFilters, SearchQuery, VehiclePage};
pub use theft_report::{TheftReport, TheftReportDraft};
pub use vehicle::{BikeType, VehicleDraft, VehicleIdentity, VehicleStatus};
