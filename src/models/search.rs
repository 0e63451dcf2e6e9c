//! Consulta de búsqueda
//!
//! Un atributo más un término se combinan en una única variante `SearchQuery`,
//! que es lo que reciben los stores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::models::vehicle::{VehicleIdentity, VehicleStatus};
use crate::utils::validation::validate_not_empty;

/// Tamaño de página por defecto y máximo de `/api/search/bikes`
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Atributo por el que se busca
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchAttribute {
    Vin,
    EngineNumber,
    LicensePlate,
    MakeModel,
}

impl SearchAttribute {
    pub const ALL: [SearchAttribute; 4] = [
        SearchAttribute::Vin,
        SearchAttribute::EngineNumber,
        SearchAttribute::LicensePlate,
        SearchAttribute::MakeModel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchAttribute::Vin => "vin",
            SearchAttribute::EngineNumber => "engine_number",
            SearchAttribute::LicensePlate => "license_plate",
            SearchAttribute::MakeModel => "make_model",
        }
    }
}

impl fmt::Display for SearchAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchAttribute {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SearchAttribute::ALL
            .into_iter()
            .find(|attribute| attribute.as_str() == value)
            .ok_or_else(|| format!("unknown search attribute '{}'", value))
    }
}

/// Consulta ya validada: el término nunca está vacío
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Vin(String),
    EngineNumber(String),
    LicensePlate(String),
    /// Subcadena sin distinguir mayúsculas sobre `make` O `model`
    MakeModel(String),
}

impl SearchQuery {
    /// El término se guarda tal cual; solo se rechaza si está vacío tras `trim`.
    /// El VIN debe llegar ya en mayúsculas.
    pub fn new(attribute: SearchAttribute, term: impl Into<String>) -> Result<Self, ValidationErrors> {
        let term = term.into();
        if let Err(error) = validate_not_empty(&term) {
            let mut errors = ValidationErrors::new();
            errors.add("term", error);
            return Err(errors);
        }

        Ok(match attribute {
            SearchAttribute::Vin => SearchQuery::Vin(term),
            SearchAttribute::EngineNumber => SearchQuery::EngineNumber(term),
            SearchAttribute::LicensePlate => SearchQuery::LicensePlate(term),
            SearchAttribute::MakeModel => SearchQuery::MakeModel(term),
        })
    }

    pub fn attribute(&self) -> SearchAttribute {
        match self {
            SearchQuery::Vin(_) => SearchAttribute::Vin,
            SearchQuery::EngineNumber(_) => SearchAttribute::EngineNumber,
            SearchQuery::LicensePlate(_) => SearchAttribute::LicensePlate,
            SearchQuery::MakeModel(_) => SearchAttribute::MakeModel,
        }
    }

    pub fn term(&self) -> &str {
        match self {
            SearchQuery::Vin(term)
            | SearchQuery::EngineNumber(term)
            | SearchQuery::LicensePlate(term)
            | SearchQuery::MakeModel(term) => term,
        }
    }

    /// Evaluación en memoria de la consulta sobre un registro
    pub fn matches(&self, vehicle: &VehicleIdentity) -> bool {
        match self {
            SearchQuery::Vin(term) => vehicle.vin == *term,
            SearchQuery::EngineNumber(term) => vehicle.engine_number == *term,
            SearchQuery::LicensePlate(term) => vehicle.license_plate.as_deref() == Some(term.as_str()),
            SearchQuery::MakeModel(term) => {
                let needle = term.to_lowercase();
                vehicle.make.to_lowercase().contains(&needle)
                    || vehicle.model.to_lowercase().contains(&needle)
            }
        }
    }
}

/// Filtros exactos que acotan una búsqueda: estado, marca, modelo, año y color.
/// Marca, modelo y color se comparan sin distinguir mayúsculas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub status: Option<VehicleStatus>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
}

impl SearchFilters {
    pub fn stolen_only() -> Self {
        Self {
            status: Some(VehicleStatus::Stolen),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evalúa los filtros sobre un registro con su estado ya derivado
    pub fn matches(&self, vehicle: &VehicleIdentity) -> bool {
        fn same(expected: &Option<String>, actual: Option<&str>) -> bool {
            match expected {
                Some(expected) => actual.is_some_and(|actual| actual.eq_ignore_ascii_case(expected)),
                None => true,
            }
        }

        self.status.map_or(true, |status| vehicle.status == status)
            && self.year.map_or(true, |year| vehicle.year == year)
            && same(&self.make, Some(&vehicle.make))
            && same(&self.model, Some(&vehicle.model))
            && same(&self.color, vehicle.color.as_deref())
    }
}

/// Página pedida (empieza en 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if page == 0 {
            let mut error = ValidationError::new("range");
            error.add_param("min".into(), &1);
            errors.add("page", error);
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            let mut error = ValidationError::new("range");
            error.add_param("min".into(), &1);
            error.add_param("max".into(), &MAX_PAGE_SIZE);
            errors.add("page_size", error);
        }

        if errors.errors().is_empty() {
            Ok(Self { page, page_size })
        } else {
            Err(errors)
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Una página de resultados; `count` es el total de coincidencias
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePage {
    pub count: usize,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<VehicleIdentity>,
}

impl VehiclePage {
    /// Corta una lista completa (ya ordenada) en la página pedida
    pub fn slice(matches: Vec<VehicleIdentity>, page: PageRequest) -> Self {
        let count = matches.len();
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let results = matches
            .into_iter()
            .skip(offset)
            .take(page.page_size as usize)
            .collect();

        Self {
            count,
            page: page.page,
            page_size: page.page_size,
            results,
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize).saturating_mul(self.page_size as usize) < self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::BikeType;
    use chrono::Utc;
    use uuid::Uuid;

    fn bike(make: &str, model: &str, plate: Option<&str>) -> VehicleIdentity {
        VehicleIdentity {
            id: Uuid::new_v4(),
            vin: "1HD1KB4187Y123456".to_string(),
            engine_number: "E123".to_string(),
            license_plate: plate.map(str::to_string),
            make: make.to_string(),
            model: model.to_string(),
            year: 2020,
            color: None,
            bike_type: BikeType::Sport,
            status: VehicleStatus::Clean,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_attribute_names_round_trip() {
        for attribute in SearchAttribute::ALL {
            assert_eq!(attribute.as_str().parse::<SearchAttribute>().unwrap(), attribute);
        }
        assert!("colour".parse::<SearchAttribute>().is_err());
    }

    #[test]
    fn test_blank_terms_are_rejected() {
        assert!(SearchQuery::new(SearchAttribute::Vin, "").is_err());
        assert!(SearchQuery::new(SearchAttribute::MakeModel, " \t ").is_err());
    }

    #[test]
    fn test_exact_modes_are_case_sensitive() {
        let vehicle = bike("Ducati", "Panigale", Some("AB-123"));
        let vin = SearchQuery::new(SearchAttribute::Vin, "1hd1kb4187y123456").unwrap();
        let plate = SearchQuery::new(SearchAttribute::LicensePlate, "AB-123").unwrap();
        assert!(!vin.matches(&vehicle));
        assert!(plate.matches(&vehicle));
    }

    #[test]
    fn test_make_model_matches_either_field() {
        let query = SearchQuery::new(SearchAttribute::MakeModel, "duc").unwrap();
        assert!(query.matches(&bike("Ducati", "Monster", None)));
        assert!(query.matches(&bike("Custom", "Ducster", None)));
        assert!(!query.matches(&bike("Honda", "CB500", None)));
    }

    #[test]
    fn test_plate_query_never_matches_missing_plate() {
        let query = SearchQuery::new(SearchAttribute::LicensePlate, "AB-123").unwrap();
        assert!(!query.matches(&bike("Ducati", "Monster", None)));
    }

    #[test]
    fn test_filters_narrow_by_status_year_and_color() {
        let mut red = bike("Ducati", "Monster", None);
        red.color = Some("Red".to_string());
        red.status = VehicleStatus::Stolen;
        let plain = bike("Ducati", "Panigale", None);

        assert!(SearchFilters::default().matches(&plain));
        assert!(SearchFilters::stolen_only().matches(&red));
        assert!(!SearchFilters::stolen_only().matches(&plain));

        let filters = SearchFilters {
            make: Some("DUCATI".to_string()),
            color: Some("red".to_string()),
            year: Some(2020),
            ..SearchFilters::default()
        };
        assert!(filters.matches(&red));
        // Sin color no hay coincidencia con un filtro de color
        assert!(!filters.matches(&plain));
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(1, 20).is_ok());
        assert!(PageRequest::new(0, 20).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_slice_reports_total_count() {
        let all: Vec<_> = (0..5).map(|i| bike("Honda", &format!("CB{}", i), None)).collect();
        let page = VehiclePage::slice(all, PageRequest::new(2, 2).unwrap());

        assert_eq!(page.count, 5);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].model, "CB2");
        assert!(page.has_next());

        let last = VehiclePage::slice(Vec::new(), PageRequest::new(4, 2).unwrap());
        assert_eq!(last.count, 0);
        assert!(last.results.is_empty());
        assert!(!last.has_next());
    }
}
