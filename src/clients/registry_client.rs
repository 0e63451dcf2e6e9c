//! Cliente HTTP del registro
//!
//! Implementa `VehicleStore` contra otro despliegue de esta misma API, de modo
//! que el flujo de reporte y la búsqueda funcionan igual con un backend remoto.
//! Los errores del sobre `{error, message, details, code}` se traducen de
//! vuelta a `AppError`: primero por `code`, luego por el status HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::dto::{ApiResponse, SearchBikesParams, SearchResponse};
use crate::models::search::MAX_PAGE_SIZE;
use crate::models::{
    PageRequest, SearchFilters, SearchQuery, TheftReport, TheftReportDraft, VehicleDraft, VehicleIdentity,
    VehiclePage,
};
use crate::repositories::VehicleStore;
use crate::utils::errors::{validation_error, AppError, AppResult, ErrorResponse};

#[derive(Debug, Clone)]
pub struct RegistryApiClient {
    client: Client,
    base_url: String,
}

impl RegistryApiClient {
    /// Crear nuevo cliente HTTP apuntando a `base_url` (sin `/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Cuerpo JSON tal cual, o el error traducido
    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.json::<ErrorResponse>().await.ok();
        Err(map_error_response(status, body))
    }

    /// Campo `data` del sobre `ApiResponse`
    async fn read_data<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let envelope: ApiResponse<T> = Self::read_json(response).await?;
        envelope
            .data
            .ok_or_else(|| AppError::StoreUnavailable("registry answered without data".to_string()))
    }
}

/// Traduce una respuesta de error del registro a la taxonomía local
pub fn map_error_response(status: StatusCode, body: Option<ErrorResponse>) -> AppError {
    let message = body
        .as_ref()
        .map(|b| b.message.clone())
        .unwrap_or_else(|| format!("registry answered {}", status));

    match body.as_ref().and_then(|b| b.code.as_deref()) {
        Some("VALIDATION_ERROR") => return validation_error("request", message),
        Some("CONFLICT") => return AppError::Conflict(message),
        Some("NOT_FOUND") => return AppError::NotFound(message),
        Some("STORE_UNAVAILABLE") => return AppError::StoreUnavailable(message),
        Some(other) => {
            warn!("⚠️ Código de error inesperado del registro: {}", other);
        }
        None => {}
    }

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => validation_error("request", message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::StoreUnavailable(message),
    }
}

#[async_trait]
impl VehicleStore for RegistryApiClient {
    #[instrument(skip(self, draft), fields(vin = %draft.vin))]
    async fn create_vehicle(&self, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let response = self.client.post(self.url("/bikes")).json(draft).send().await?;
        Self::read_data(response).await
    }

    #[instrument(skip(self, draft))]
    async fn update_vehicle(&self, id: Uuid, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let response = self
            .client
            .put(self.url(&format!("/bikes/{}", id)))
            .json(draft)
            .send()
            .await?;
        Self::read_data(response).await
    }

    #[instrument(skip(self, report))]
    async fn attach_theft_report(&self, vehicle_id: Uuid, report: &TheftReportDraft) -> AppResult<TheftReport> {
        let response = self
            .client
            .post(self.url(&format!("/bikes/{}/report_stolen", vehicle_id)))
            .json(report)
            .send()
            .await?;
        Self::read_data(response).await
    }

    /// Recorre todas las páginas del registro remoto
    #[instrument(skip(self), fields(attribute = %query.attribute()))]
    async fn query_vehicles(&self, query: &SearchQuery) -> AppResult<Vec<VehicleIdentity>> {
        let filters = SearchFilters::default();
        let mut results = Vec::new();
        let mut number = 1;

        loop {
            let page = PageRequest::new(number, MAX_PAGE_SIZE)?;
            let current = self.search_vehicles(query, &filters, page).await?;
            let more = current.has_next() && !current.results.is_empty();
            results.extend(current.results);
            if !more {
                break;
            }
            number += 1;
        }

        Ok(results)
    }

    #[instrument(skip(self), fields(attribute = %query.attribute()))]
    async fn search_vehicles(
        &self,
        query: &SearchQuery,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<VehiclePage> {
        let params = SearchBikesParams::for_page(query.attribute(), query.term(), filters, page);
        let response = self
            .client
            .get(self.url("/search/bikes"))
            .query(&params)
            .send()
            .await?;

        let body: SearchResponse = Self::read_json(response).await?;
        debug!(
            "🔍 Registro remoto devolvió {} de {} resultados (página {})",
            body.results.len(),
            body.count,
            body.page
        );
        Ok(VehiclePage::from(body))
    }

    #[instrument(skip(self))]
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<VehicleIdentity>> {
        let response = self.client.get(self.url(&format!("/bikes/{}", id))).send().await?;
        match Self::read_data(response).await {
            Ok(vehicle) => Ok(Some(vehicle)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn list_active_reports(&self) -> AppResult<Vec<TheftReport>> {
        let response = self.client.get(self.url("/reports")).send().await?;
        Self::read_data(response).await
    }
}
