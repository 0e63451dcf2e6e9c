use serde::{Deserialize, Serialize};

use crate::models::search::DEFAULT_PAGE_SIZE;
use crate::models::{PageRequest, SearchAttribute, SearchFilters, VehicleIdentity, VehiclePage, VehicleStatus};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::non_blank;

// Query string de `/api/search/bikes`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBikesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    /// Marca o modelo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    // Filtros exactos, combinables con cualquier búsqueda
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl SearchBikesParams {
    /// Exactamente uno de los parámetros debe venir. El VIN se pasa a mayúsculas.
    pub fn into_query_parts(self) -> AppResult<(SearchAttribute, String)> {
        let candidates = [
            (SearchAttribute::Vin, self.vin.map(|vin| vin.to_uppercase())),
            (SearchAttribute::EngineNumber, self.engine_number),
            (SearchAttribute::LicensePlate, self.license_plate),
            (SearchAttribute::MakeModel, self.search),
        ];

        let mut present = candidates
            .into_iter()
            .filter_map(|(attribute, term)| term.map(|term| (attribute, term)));

        match (present.next(), present.next()) {
            (Some(part), None) => Ok(part),
            (None, _) => Err(validation_error(
                "search",
                "Provide one of vin, engine_number, license_plate or search",
            )),
            (Some(_), Some(_)) => Err(validation_error(
                "search",
                "Only one search parameter can be used at a time",
            )),
        }
    }

    /// Filtros presentes; los de texto en blanco se ignoran
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            status: self.status,
            make: non_blank(self.make.clone()),
            model: non_blank(self.model.clone()),
            year: self.year,
            color: non_blank(self.color.clone()),
        }
    }

    /// Página 1 y `DEFAULT_PAGE_SIZE` si no se indican
    pub fn page_request(&self) -> AppResult<PageRequest> {
        let page = PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )?;
        Ok(page)
    }

    /// Parámetros que reproducen la misma búsqueda filtrada y paginada
    pub fn for_page(
        attribute: SearchAttribute,
        term: &str,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Self {
        Self {
            status: filters.status,
            make: filters.make.clone(),
            model: filters.model.clone(),
            year: filters.year,
            color: filters.color.clone(),
            page: Some(page.page()),
            page_size: Some(page.page_size()),
            ..Self::for_attribute(attribute, term)
        }
    }

    pub fn for_attribute(attribute: SearchAttribute, term: &str) -> Self {
        let term = Some(term.to_string());
        match attribute {
            SearchAttribute::Vin => Self { vin: term, ..Self::default() },
            SearchAttribute::EngineNumber => Self { engine_number: term, ..Self::default() },
            SearchAttribute::LicensePlate => Self { license_plate: term, ..Self::default() },
            SearchAttribute::MakeModel => Self { search: term, ..Self::default() },
        }
    }
}

// `count` es el total de coincidencias, no el tamaño de `results`
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: usize,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<VehicleIdentity>,
}

impl From<VehiclePage> for SearchResponse {
    fn from(page: VehiclePage) -> Self {
        Self {
            count: page.count,
            page: page.page,
            page_size: page.page_size,
            results: page.results,
        }
    }
}

impl From<SearchResponse> for VehiclePage {
    fn from(response: SearchResponse) -> Self {
        Self {
            count: response.count,
            page: response.page,
            page_size: response.page_size,
            results: response.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    #[test]
    fn test_single_parameter_selects_attribute() {
        let params = SearchBikesParams {
            vin: Some("1hd1kb4187y123456".to_string()),
            ..SearchBikesParams::default()
        };
        let (attribute, term) = params.into_query_parts().unwrap();
        assert_eq!(attribute, SearchAttribute::Vin);
        assert_eq!(term, "1HD1KB4187Y123456");

        let (attribute, term) = SearchBikesParams::for_attribute(SearchAttribute::MakeModel, "duc")
            .into_query_parts()
            .unwrap();
        assert_eq!(attribute, SearchAttribute::MakeModel);
        assert_eq!(term, "duc");
    }

    #[test]
    fn test_zero_or_many_parameters_are_rejected() {
        let none = SearchBikesParams::default().into_query_parts().unwrap_err();
        assert!(matches!(none, AppError::Validation(_)));

        let many = SearchBikesParams {
            vin: Some("A".to_string()),
            search: Some("duc".to_string()),
            ..SearchBikesParams::default()
        };
        assert!(matches!(many.into_query_parts(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_filters_and_page_defaults() {
        let params = SearchBikesParams {
            search: Some("duc".to_string()),
            status: Some(VehicleStatus::Stolen),
            color: Some("  ".to_string()),
            year: Some(2020),
            ..SearchBikesParams::default()
        };

        let filters = params.filters();
        assert_eq!(filters.status, Some(VehicleStatus::Stolen));
        assert_eq!(filters.year, Some(2020));
        assert_eq!(filters.color, None);

        let page = params.page_request().unwrap();
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);

        let out_of_range = SearchBikesParams {
            page: Some(0),
            ..SearchBikesParams::default()
        };
        assert!(matches!(out_of_range.page_request(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_string_from_params() {
        let filters = SearchFilters::stolen_only();
        let page = PageRequest::new(2, 50).unwrap();
        let params = SearchBikesParams::for_page(SearchAttribute::MakeModel, "duc", &filters, page);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["search"], "duc");
        assert_eq!(value["status"], "STOLEN");
        assert_eq!(value["page"], 2);
        assert_eq!(value["page_size"], 50);
        assert!(value.get("color").is_none());
    }

    #[test]
    fn test_blank_term_passes_through_for_the_service_to_reject() {
        let params = SearchBikesParams::for_attribute(SearchAttribute::LicensePlate, "  ");
        let (_, term) = params.into_query_parts().unwrap();
        assert_eq!(term, "  ");
    }
}
