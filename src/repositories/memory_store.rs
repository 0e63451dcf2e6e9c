use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::VehicleStore;
use crate::models::{
    PageRequest, SearchFilters, SearchQuery, TheftReport, TheftReportDraft, VehicleDraft, VehicleIdentity,
    VehiclePage, VehicleStatus,
};
use crate::utils::errors::{conflict_error, not_found_error, validation_error, AppResult};

#[derive(Default)]
struct Inner {
    // Orden de inserción; las lecturas devuelven el más reciente primero
    bikes: Vec<VehicleIdentity>,
    reports: Vec<TheftReport>,
}

impl Inner {
    fn has_active_report(&self, vehicle_id: Uuid) -> bool {
        self.reports
            .iter()
            .any(|report| report.vehicle_id == vehicle_id && report.is_active)
    }

    fn with_status(&self, bike: &VehicleIdentity) -> VehicleIdentity {
        VehicleIdentity {
            status: VehicleStatus::from_report_exists(self.has_active_report(bike.id)),
            ..bike.clone()
        }
    }

    /// VIN y número de motor son únicos; la matrícula no
    fn check_unique(&self, draft: &VehicleDraft, skip_id: Option<Uuid>) -> AppResult<()> {
        for bike in self.bikes.iter().filter(|bike| Some(bike.id) != skip_id) {
            if bike.vin == draft.vin {
                return Err(conflict_error("Bike", "vin", &draft.vin));
            }
            if bike.engine_number == draft.engine_number {
                return Err(conflict_error("Bike", "engine_number", &draft.engine_number));
            }
        }
        Ok(())
    }
}

/// Store en memoria para desarrollo y tests.
/// Motos y reportes comparten un único lock, así que adjuntar un reporte y
/// leer el estado derivado nunca se ven a medias.
#[derive(Default)]
pub struct MemoryVehicleStore {
    inner: RwLock<Inner>,
}

impl MemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn vehicle_count(&self) -> usize {
        self.inner.read().await.bikes.len()
    }
}

#[async_trait]
impl VehicleStore for MemoryVehicleStore {
    async fn create_vehicle(&self, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let mut inner = self.inner.write().await;
        inner.check_unique(draft, None)?;

        let now = Utc::now();
        let bike = VehicleIdentity {
            id: Uuid::new_v4(),
            vin: draft.vin.clone(),
            engine_number: draft.engine_number.clone(),
            license_plate: draft.license_plate.clone(),
            make: draft.make.clone(),
            model: draft.model.clone(),
            year: draft.year,
            color: draft.color.clone(),
            bike_type: draft.bike_type,
            status: VehicleStatus::Clean,
            created_at: now,
            updated_at: now,
        };
        inner.bikes.push(bike.clone());
        debug!("🏍️ Moto {} creada en memoria ({} total)", bike.id, inner.bikes.len());

        Ok(bike)
    }

    async fn update_vehicle(&self, id: Uuid, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let mut inner = self.inner.write().await;
        if !inner.bikes.iter().any(|bike| bike.id == id) {
            return Err(not_found_error("Bike", &id.to_string()));
        }
        inner.check_unique(draft, Some(id))?;

        let bike = inner
            .bikes
            .iter_mut()
            .find(|bike| bike.id == id)
            .ok_or_else(|| not_found_error("Bike", &id.to_string()))?;

        bike.vin = draft.vin.clone();
        bike.engine_number = draft.engine_number.clone();
        bike.license_plate = draft.license_plate.clone();
        bike.make = draft.make.clone();
        bike.model = draft.model.clone();
        bike.year = draft.year;
        bike.color = draft.color.clone();
        bike.bike_type = draft.bike_type;
        bike.updated_at = Utc::now();

        let updated = bike.clone();
        Ok(inner.with_status(&updated))
    }

    async fn attach_theft_report(&self, vehicle_id: Uuid, report: &TheftReportDraft) -> AppResult<TheftReport> {
        let mut inner = self.inner.write().await;

        if !inner.bikes.iter().any(|bike| bike.id == vehicle_id) {
            return Err(not_found_error("Bike", &vehicle_id.to_string()));
        }
        if inner.has_active_report(vehicle_id) {
            return Err(conflict_error("Theft report", "bike", &vehicle_id.to_string()));
        }

        // El flujo ya validó la fecha; aquí solo se protege el contrato del store
        let last_seen_date = report
            .last_seen_date
            .ok_or_else(|| validation_error("last_seen_date", "last seen date is required"))?;

        let stored = TheftReport {
            id: Uuid::new_v4(),
            vehicle_id,
            last_seen_location: report.last_seen_location.clone(),
            last_seen_date,
            police_report_number: report.police_report_number.clone(),
            contact_phone: report.contact_phone.clone(),
            additional_details: report.additional_details.clone(),
            reported_at: Utc::now(),
            is_active: true,
        };
        inner.reports.push(stored.clone());

        Ok(stored)
    }

    async fn query_vehicles(&self, query: &SearchQuery) -> AppResult<Vec<VehicleIdentity>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bikes
            .iter()
            .rev()
            .filter(|bike| query.matches(bike))
            .map(|bike| inner.with_status(bike))
            .collect())
    }

    async fn search_vehicles(
        &self,
        query: &SearchQuery,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<VehiclePage> {
        let inner = self.inner.read().await;
        let matches = inner
            .bikes
            .iter()
            .rev()
            .filter(|bike| query.matches(bike))
            .map(|bike| inner.with_status(bike))
            .filter(|bike| filters.matches(bike))
            .collect();
        Ok(VehiclePage::slice(matches, page))
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<VehicleIdentity>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bikes
            .iter()
            .find(|bike| bike.id == id)
            .map(|bike| inner.with_status(bike)))
    }

    async fn list_active_reports(&self) -> AppResult<Vec<TheftReport>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reports
            .iter()
            .rev()
            .filter(|report| report.is_active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BikeType, SearchAttribute};
    use crate::utils::errors::AppError;
    use crate::utils::validation::parse_local_datetime;

    fn report() -> TheftReportDraft {
        TheftReportDraft::new("5th Ave", parse_local_datetime("2024-01-01T10:00").unwrap(), "555-1234")
    }

    #[tokio::test]
    async fn test_duplicate_vin_is_a_conflict() {
        let store = MemoryVehicleStore::new();
        store
            .create_vehicle(&VehicleDraft::new("VIN00000000000001", "E1", "Honda", "CB500"))
            .await
            .unwrap();

        let err = store
            .create_vehicle(&VehicleDraft::new("VIN00000000000001", "E2", "Honda", "CB650"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.vehicle_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_may_keep_its_own_unique_values() {
        let store = MemoryVehicleStore::new();
        let draft = VehicleDraft::new("VIN00000000000001", "E1", "Honda", "CB500");
        let created = store.create_vehicle(&draft).await.unwrap();

        let updated = store
            .update_vehicle(created.id, &draft.clone().with_color("black"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.color.as_deref(), Some("black"));
    }

    #[tokio::test]
    async fn test_attach_report_to_unknown_bike() {
        let store = MemoryVehicleStore::new();
        let err = store.attach_theft_report(Uuid::new_v4(), &report()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_report_is_rejected() {
        let store = MemoryVehicleStore::new();
        let bike = store
            .create_vehicle(&VehicleDraft::new("VIN00000000000001", "E1", "Honda", "CB500"))
            .await
            .unwrap();

        store.attach_theft_report(bike.id, &report()).await.unwrap();
        let err = store.attach_theft_report(bike.id, &report()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list_active_reports().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_is_derived_on_every_read() {
        let store = MemoryVehicleStore::new();
        let bike = store
            .create_vehicle(&VehicleDraft::new("VIN00000000000001", "E1", "Honda", "CB500"))
            .await
            .unwrap();
        assert_eq!(bike.status, VehicleStatus::Clean);

        store.attach_theft_report(bike.id, &report()).await.unwrap();

        let fetched = store.get_vehicle(bike.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, VehicleStatus::Stolen);

        let query = SearchQuery::new(SearchAttribute::EngineNumber, "E1").unwrap();
        let found = store.query_vehicles(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_stolen());
    }

    #[tokio::test]
    async fn test_query_returns_newest_first() {
        let store = MemoryVehicleStore::new();
        store
            .create_vehicle(&VehicleDraft::new("VIN00000000000001", "E1", "Ducati", "Monster"))
            .await
            .unwrap();
        store
            .create_vehicle(&VehicleDraft::new("VIN00000000000002", "E2", "Ducati", "Panigale"))
            .await
            .unwrap();

        let query = SearchQuery::new(SearchAttribute::MakeModel, "ducati").unwrap();
        let found = store.query_vehicles(&query).await.unwrap();
        let models: Vec<&str> = found.iter().map(|bike| bike.model.as_str()).collect();
        assert_eq!(models, vec!["Panigale", "Monster"]);
    }

    #[tokio::test]
    async fn test_optional_fields_round_trip() {
        let store = MemoryVehicleStore::new();
        let bike = store
            .create_vehicle(
                &VehicleDraft::new("JYARJ16E08A012345", "E77", "Yamaha", "XMAX")
                    .with_bike_type(BikeType::Scooter)
                    .with_color("Grey")
                    .with_license_plate("YM-77"),
            )
            .await
            .unwrap();
        assert_eq!(bike.bike_type, BikeType::Scooter);
        assert_eq!(bike.license_plate.as_deref(), Some("YM-77"));

        let stored = store
            .attach_theft_report(
                bike.id,
                &report()
                    .with_police_report_number("PR-2024-001")
                    .with_additional_details("Top box was open"),
            )
            .await
            .unwrap();
        assert_eq!(stored.police_report_number.as_deref(), Some("PR-2024-001"));
        assert_eq!(stored.additional_details.as_deref(), Some("Top box was open"));

        let listed = store.list_active_reports().await.unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_search_applies_filters_and_pages() {
        let store = MemoryVehicleStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let vin = format!("ZDM1RB5T67B01234{}", i);
            let draft = VehicleDraft::new(vin, format!("E{}", i), "Ducati", "Monster")
                .with_color(if i % 2 == 0 { "Red" } else { "Black" });
            ids.push(store.create_vehicle(&draft).await.unwrap().id);
        }
        store.attach_theft_report(ids[0], &report()).await.unwrap();
        store.attach_theft_report(ids[4], &report()).await.unwrap();

        let query = SearchQuery::new(SearchAttribute::MakeModel, "duc").unwrap();

        let stolen = store
            .search_vehicles(&query, &SearchFilters::stolen_only(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(stolen.count, 2);
        // Más reciente primero
        assert_eq!(stolen.results[0].id, ids[4]);
        assert!(stolen.results.iter().all(|bike| bike.is_stolen()));

        let red = SearchFilters {
            color: Some("red".to_string()),
            ..SearchFilters::default()
        };
        let second_page = store
            .search_vehicles(&query, &red, PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(second_page.count, 3);
        assert_eq!(second_page.results.len(), 1);
        assert_eq!(second_page.results[0].id, ids[0]);
    }
}
