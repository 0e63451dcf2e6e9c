//! Servicio de búsqueda de motos
//!
//! Resuelve una consulta (atributo + término) contra el store. No cachea nada:
//! cada llamada vuelve a consultar y el estado CLEAN/STOLEN es el del momento.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    PageRequest, SearchAttribute, SearchFilters, SearchQuery, TheftReport, VehicleIdentity, VehiclePage,
};
use crate::repositories::VehicleStore;
use crate::utils::errors::{not_found_error, AppResult};

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn VehicleStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn VehicleStore>) -> Self {
        Self { store }
    }

    /// Término vacío => `Validation` sin tocar el store.
    /// Cero resultados es un vector vacío, no un error.
    pub async fn search(&self, attribute: SearchAttribute, term: &str) -> AppResult<Vec<VehicleIdentity>> {
        let query = SearchQuery::new(attribute, term)?;
        self.run(&query).await
    }

    pub async fn run(&self, query: &SearchQuery) -> AppResult<Vec<VehicleIdentity>> {
        debug!("🔍 Buscando por {} = '{}'", query.attribute(), query.term());

        let results = self.store.query_vehicles(query).await?;
        let stolen = results.iter().filter(|bike| bike.is_stolen()).count();
        info!(
            "🔍 Búsqueda por {}: {} resultados ({} robadas)",
            query.attribute(),
            results.len(),
            stolen
        );

        Ok(results)
    }

    /// Búsqueda con filtros exactos y paginada, tal como la expone la API
    pub async fn search_page(
        &self,
        attribute: SearchAttribute,
        term: &str,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<VehiclePage> {
        let query = SearchQuery::new(attribute, term)?;
        debug!(
            "🔍 Buscando por {} = '{}' (filtros: {:?}, página {})",
            query.attribute(),
            query.term(),
            filters,
            page.page()
        );

        let result = self.store.search_vehicles(&query, filters, page).await?;
        info!(
            "🔍 Búsqueda por {}: {} coincidencias, {} en la página {}",
            query.attribute(),
            result.count,
            result.results.len(),
            result.page
        );

        Ok(result)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<VehicleIdentity> {
        self.store
            .get_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Bike", &id.to_string()))
    }

    pub async fn active_reports(&self) -> AppResult<Vec<TheftReport>> {
        self.store.list_active_reports().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TheftReportDraft, VehicleDraft, VehicleStatus};
    use crate::repositories::MemoryVehicleStore;
    use crate::utils::errors::AppError;
    use crate::utils::validation::parse_local_datetime;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store que nunca responde bien; cuenta cuántas veces se le llama
    #[derive(Default)]
    struct DownStore {
        calls: AtomicUsize,
    }

    impl DownStore {
        fn fail<T>(&self) -> AppResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::StoreUnavailable("connection reset".to_string()))
        }
    }

    #[async_trait]
    impl VehicleStore for DownStore {
        async fn create_vehicle(&self, _: &VehicleDraft) -> AppResult<VehicleIdentity> {
            self.fail()
        }
        async fn update_vehicle(&self, _: Uuid, _: &VehicleDraft) -> AppResult<VehicleIdentity> {
            self.fail()
        }
        async fn attach_theft_report(&self, _: Uuid, _: &TheftReportDraft) -> AppResult<TheftReport> {
            self.fail()
        }
        async fn query_vehicles(&self, _: &SearchQuery) -> AppResult<Vec<VehicleIdentity>> {
            self.fail()
        }
        async fn get_vehicle(&self, _: Uuid) -> AppResult<Option<VehicleIdentity>> {
            self.fail()
        }
        async fn list_active_reports(&self) -> AppResult<Vec<TheftReport>> {
            self.fail()
        }
    }

    async fn seeded() -> (Arc<MemoryVehicleStore>, SearchService) {
        let store = Arc::new(MemoryVehicleStore::new());
        let drafts = [
            VehicleDraft::new("1HD1KB4187Y123456", "E123", "Ducati", "Panigale")
                .with_year(2020)
                .with_license_plate("DU-220"),
            VehicleDraft::new("ZDM1RB5T67B012345", "E456", "DUCATI", "Monster"),
            VehicleDraft::new("JH2RC4463KM012345", "E789", "Honda", "CBR600"),
        ];
        for draft in &drafts {
            store.create_vehicle(draft).await.unwrap();
        }
        let service = SearchService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_exact_vin_returns_one_record() {
        let (_, service) = seeded().await;
        let found = service
            .search(SearchAttribute::Vin, "1HD1KB4187Y123456")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vin, "1HD1KB4187Y123456");
    }

    #[tokio::test]
    async fn test_make_model_is_case_insensitive_substring() {
        let (_, service) = seeded().await;
        let found = service.search(SearchAttribute::MakeModel, "duc").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|bike| bike.make.eq_ignore_ascii_case("ducati")));
    }

    #[tokio::test]
    async fn test_make_model_matches_model_field() {
        let (_, service) = seeded().await;
        let found = service.search(SearchAttribute::MakeModel, "cbr").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].make, "Honda");
    }

    #[tokio::test]
    async fn test_plate_and_engine_number_lookups() {
        let (_, service) = seeded().await;
        assert_eq!(
            service.search(SearchAttribute::LicensePlate, "DU-220").await.unwrap().len(),
            1
        );
        assert_eq!(
            service.search(SearchAttribute::EngineNumber, "E789").await.unwrap()[0].model,
            "CBR600"
        );
        // Exacto: sin coincidencias parciales ni de mayúsculas
        assert!(service
            .search(SearchAttribute::EngineNumber, "e789")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let (_, service) = seeded().await;
        let found = service.search(SearchAttribute::Vin, "NOPE").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_blank_term_never_reaches_store() {
        let store = Arc::new(DownStore::default());
        let service = SearchService::new(store.clone());

        for term in ["", "   ", "\t\n"] {
            let err = service.search(SearchAttribute::MakeModel, term).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_distinct_from_no_match() {
        let service = SearchService::new(Arc::new(DownStore::default()));
        let err = service.search(SearchAttribute::Vin, "X").await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_status_reflects_report_at_query_time() {
        let (store, service) = seeded().await;
        let before = service.search(SearchAttribute::Vin, "1HD1KB4187Y123456").await.unwrap();
        assert_eq!(before[0].status, VehicleStatus::Clean);

        let report = TheftReportDraft::new(
            "5th Ave",
            parse_local_datetime("2024-01-01T10:00").unwrap(),
            "555-1234",
        );
        store.attach_theft_report(before[0].id, &report).await.unwrap();

        let after = service.search(SearchAttribute::Vin, "1HD1KB4187Y123456").await.unwrap();
        assert_eq!(after[0].status, VehicleStatus::Stolen);
        assert_eq!(service.active_reports().await.unwrap().len(), 1);
        assert!(service.find_by_id(before[0].id).await.unwrap().is_stolen());
    }

    #[tokio::test]
    async fn test_search_page_filters_stolen_and_pages() {
        let (store, service) = seeded().await;
        let monster = service.search(SearchAttribute::Vin, "ZDM1RB5T67B012345").await.unwrap();
        let report = TheftReportDraft::new(
            "Main St",
            parse_local_datetime("2024-02-01T08:30").unwrap(),
            "555-9876",
        );
        store.attach_theft_report(monster[0].id, &report).await.unwrap();

        let stolen = service
            .search_page(
                SearchAttribute::MakeModel,
                "duc",
                &SearchFilters::stolen_only(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(stolen.count, 1);
        assert_eq!(stolen.results[0].model, "Monster");

        let first = service
            .search_page(
                SearchAttribute::MakeModel,
                "duc",
                &SearchFilters::default(),
                PageRequest::new(1, 1).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.count, 2);
        assert_eq!(first.results.len(), 1);
        assert!(first.has_next());
    }

    #[tokio::test]
    async fn test_search_page_rejects_blank_term() {
        let store = Arc::new(DownStore::default());
        let service = SearchService::new(store.clone());
        let err = service
            .search_page(SearchAttribute::Vin, " ", &SearchFilters::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_find_unknown_id() {
        let (_, service) = seeded().await;
        let err = service.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
