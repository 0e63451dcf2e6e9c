//! Repositorios
//!
//! `VehicleStore` es el contrato del almacén de motos que consumen el flujo de
//! reporte y el servicio de búsqueda. Hay tres implementaciones: PostgreSQL
//! (`bike_repository`), memoria (`memory_store`) y HTTP
//! (`crate::clients::registry_client`).

pub mod bike_repository;
pub mod memory_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    PageRequest, SearchFilters, SearchQuery, TheftReport, TheftReportDraft, VehicleDraft, VehicleIdentity,
    VehiclePage,
};
use crate::utils::errors::AppResult;

pub use bike_repository::PgVehicleStore;
pub use memory_store::MemoryVehicleStore;

/// Almacén de motos y reportes de robo.
///
/// El `status` de cada `VehicleIdentity` devuelta se deriva en la lectura:
/// STOLEN si y solo si existe un reporte activo para esa moto.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Falla con `Conflict` si el VIN o el número de motor ya existen
    async fn create_vehicle(&self, draft: &VehicleDraft) -> AppResult<VehicleIdentity>;

    /// Actualiza en sitio; `NotFound` si el id no existe
    async fn update_vehicle(&self, id: Uuid, draft: &VehicleDraft) -> AppResult<VehicleIdentity>;

    /// `NotFound` si la moto no existe, `Conflict` si ya tiene reporte
    async fn attach_theft_report(&self, vehicle_id: Uuid, report: &TheftReportDraft) -> AppResult<TheftReport>;

    /// Sin coincidencias => vector vacío
    async fn query_vehicles(&self, query: &SearchQuery) -> AppResult<Vec<VehicleIdentity>>;

    /// Igual que `query_vehicles` más filtros exactos y paginación.
    /// Por defecto filtra y corta en memoria sobre `query_vehicles`.
    async fn search_vehicles(
        &self,
        query: &SearchQuery,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<VehiclePage> {
        let matches = self
            .query_vehicles(query)
            .await?
            .into_iter()
            .filter(|vehicle| filters.matches(vehicle))
            .collect();
        Ok(VehiclePage::slice(matches, page))
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<VehicleIdentity>>;

    async fn list_active_reports(&self) -> AppResult<Vec<TheftReport>>;
}
