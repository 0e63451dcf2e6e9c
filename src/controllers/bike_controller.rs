use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, BikeRequest, ReportTheftRequest, SearchBikesParams, SearchResponse};
use crate::models::{TheftReport, VehicleIdentity};
use crate::repositories::VehicleStore;
use crate::services::SearchService;
use crate::utils::errors::AppError;

pub struct BikeController {
    store: Arc<dyn VehicleStore>,
    search: SearchService,
}

impl BikeController {
    pub fn new(store: Arc<dyn VehicleStore>) -> Self {
        Self {
            search: SearchService::new(store.clone()),
            store,
        }
    }

    pub async fn create(&self, request: BikeRequest) -> Result<ApiResponse<VehicleIdentity>, AppError> {
        let draft = request.validated()?;

        let bike = self.store.create_vehicle(&draft).await?;
        info!("🏍️ Moto registrada: {} ({})", bike.label(), bike.id);

        Ok(ApiResponse::success_with_message(bike, "Bike registered successfully"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<VehicleIdentity>, AppError> {
        let bike = self.search.find_by_id(id).await?;
        Ok(ApiResponse::success(bike))
    }

    pub async fn update(&self, id: Uuid, request: BikeRequest) -> Result<ApiResponse<VehicleIdentity>, AppError> {
        let draft = request.validated()?;

        let bike = self.store.update_vehicle(id, &draft).await?;
        info!("✏️ Moto actualizada: {} ({})", bike.label(), bike.id);

        Ok(ApiResponse::success_with_message(bike, "Bike updated successfully"))
    }

    pub async fn report_stolen(
        &self,
        id: Uuid,
        request: ReportTheftRequest,
    ) -> Result<ApiResponse<TheftReport>, AppError> {
        request.validate()?;

        let draft = request.into_draft();
        draft.check_required()?;

        let report = self.store.attach_theft_report(id, &draft).await?;
        info!("🚨 Moto {} reportada como robada (reporte {})", id, report.id);

        Ok(ApiResponse::success_with_message(report, "Bike reported as stolen"))
    }

    pub async fn search(&self, params: SearchBikesParams) -> Result<SearchResponse, AppError> {
        let filters = params.filters();
        let page = params.page_request()?;
        let (attribute, term) = params.into_query_parts()?;

        let results = self.search.search_page(attribute, &term, &filters, page).await?;
        Ok(SearchResponse::from(results))
    }

    pub async fn active_reports(&self) -> Result<ApiResponse<Vec<TheftReport>>, AppError> {
        let reports = self.search.active_reports().await?;
        Ok(ApiResponse::success(reports))
    }
}
