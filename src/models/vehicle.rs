//! Modelo de Vehicle
//!
//! Este módulo contiene la identidad de la moto (`VehicleIdentity`), el borrador
//! que se rellena antes de crearla (`VehicleDraft`) y los enums asociados.
//! El estado CLEAN/STOLEN nunca se asigna a mano: lo calcula el store al leer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::utils::validation::{non_blank, validate_not_empty};

/// Categoría de la moto
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BikeType {
    #[default]
    Sport,
    Cruiser,
    Adventure,
    Scooter,
    Other,
}

impl BikeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BikeType::Sport => "SPORT",
            BikeType::Cruiser => "CRUISER",
            BikeType::Adventure => "ADVENTURE",
            BikeType::Scooter => "SCOOTER",
            BikeType::Other => "OTHER",
        }
    }
}

impl fmt::Display for BikeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BikeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SPORT" => Ok(BikeType::Sport),
            "CRUISER" => Ok(BikeType::Cruiser),
            "ADVENTURE" => Ok(BikeType::Adventure),
            "SCOOTER" => Ok(BikeType::Scooter),
            "OTHER" => Ok(BikeType::Other),
            other => Err(format!("unknown bike type '{}'", other)),
        }
    }
}

/// Estado derivado: STOLEN si y solo si existe un reporte de robo activo
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    #[default]
    Clean,
    Stolen,
}

impl VehicleStatus {
    pub fn from_report_exists(has_active_report: bool) -> Self {
        if has_active_report {
            VehicleStatus::Stolen
        } else {
            VehicleStatus::Clean
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Clean => f.write_str("CLEAN"),
            VehicleStatus::Stolen => f.write_str("STOLEN"),
        }
    }
}

/// Año calendario actual, usado cuando el borrador no trae año
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Datos de la moto antes de persistirla (sin `id` ni `status`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleDraft {
    pub vin: String,
    pub engine_number: String,
    #[serde(default)]
    pub license_plate: Option<String>,
    pub make: String,
    pub model: String,
    #[serde(default = "current_year")]
    pub year: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub bike_type: BikeType,
}

impl VehicleDraft {
    pub fn new(
        vin: impl Into<String>,
        engine_number: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            vin: vin.into(),
            engine_number: engine_number.into(),
            license_plate: None,
            make: make.into(),
            model: model.into(),
            year: current_year(),
            color: None,
            bike_type: BikeType::default(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_license_plate(mut self, plate: impl Into<String>) -> Self {
        self.license_plate = Some(plate.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_bike_type(mut self, bike_type: BikeType) -> Self {
        self.bike_type = bike_type;
        self
    }

    /// Comprueba los campos obligatorios (después de `trim`)
    pub fn check_required(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let required: [(&'static str, &str); 4] = [
            ("vin", &self.vin),
            ("engine_number", &self.engine_number),
            ("make", &self.make),
            ("model", &self.model),
        ];
        for (field, value) in required {
            if let Err(error) = validate_not_empty(value) {
                errors.add(field, error);
            }
        }

        if self.year <= 0 {
            let mut error = ValidationError::new("required");
            error.add_param("value".into(), &self.year);
            errors.add("year", error);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// VIN en mayúsculas, espacios recortados y opcionales vacíos a `None`
    pub fn normalized(self) -> Self {
        Self {
            vin: self.vin.trim().to_uppercase(),
            engine_number: self.engine_number.trim().to_string(),
            license_plate: non_blank(self.license_plate),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            color: non_blank(self.color),
            bike_type: self.bike_type,
        }
    }
}

/// Moto persistida, con el estado derivado en el momento de la lectura.
/// Al serializar se añade `is_stolen`; al leer se ignora.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VehicleIdentity {
    pub id: Uuid,
    pub vin: String,
    pub engine_number: String,
    pub license_plate: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub bike_type: BikeType,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Serialize for VehicleIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VehicleIdentity", 13)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("vin", &self.vin)?;
        state.serialize_field("engine_number", &self.engine_number)?;
        state.serialize_field("license_plate", &self.license_plate)?;
        state.serialize_field("make", &self.make)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("color", &self.color)?;
        state.serialize_field("bike_type", &self.bike_type)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("is_stolen", &self.is_stolen())?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("updated_at", &self.updated_at)?;
        state.end()
    }
}

impl VehicleIdentity {
    pub fn is_stolen(&self) -> bool {
        self.status == VehicleStatus::Stolen
    }

    /// Texto corto para logs: "2020 Ducati Panigale - AB123"
    pub fn label(&self) -> String {
        format!(
            "{} {} {} - {}",
            self.year,
            self.make,
            self.model,
            self.license_plate.as_deref().unwrap_or("No Plate")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ducati() -> VehicleDraft {
        VehicleDraft::new("1hd1kb4187y123456", "E123", "Ducati", "Panigale").with_year(2020)
    }

    #[test]
    fn test_new_draft_defaults() {
        let draft = VehicleDraft::new("VIN", "ENG", "Honda", "CB500");
        assert_eq!(draft.year, current_year());
        assert_eq!(draft.bike_type, BikeType::Sport);
        assert!(draft.license_plate.is_none());
    }

    #[test]
    fn test_check_required_reports_every_missing_field() {
        let draft = VehicleDraft::new("  ", "", "Ducati", " ");
        let errors = draft.check_required().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("vin"));
        assert!(fields.contains_key("engine_number"));
        assert!(fields.contains_key("model"));
        assert!(!fields.contains_key("make"));
    }

    #[test]
    fn test_normalized_uppercases_vin_and_drops_blank_optionals() {
        let draft = ducati().with_license_plate("   ").with_color(" red ").normalized();
        assert_eq!(draft.vin, "1HD1KB4187Y123456");
        assert_eq!(draft.license_plate, None);
        assert_eq!(draft.color.as_deref(), Some("red"));
        assert!(draft.check_required().is_ok());
    }

    #[test]
    fn test_draft_deserialize_applies_defaults() {
        let draft: VehicleDraft = serde_json::from_str(
            r#"{"vin":"1HD1KB4187Y123456","engine_number":"E1","make":"Ducati","model":"Monster"}"#,
        )
        .unwrap();
        assert_eq!(draft.year, current_year());
        assert_eq!(draft.bike_type, BikeType::Sport);
    }

    #[test]
    fn test_bike_type_parse_and_display() {
        assert_eq!("cruiser".parse::<BikeType>().unwrap(), BikeType::Cruiser);
        assert_eq!(BikeType::Adventure.to_string(), "ADVENTURE");
        assert!("TRACTOR".parse::<BikeType>().is_err());
    }

    #[test]
    fn test_identity_json_carries_is_stolen() {
        let now = Utc::now();
        let bike = VehicleIdentity {
            id: Uuid::new_v4(),
            vin: "1HD1KB4187Y123456".to_string(),
            engine_number: "E123".to_string(),
            license_plate: None,
            make: "Ducati".to_string(),
            model: "Panigale".to_string(),
            year: 2020,
            color: Some("Red".to_string()),
            bike_type: BikeType::Sport,
            status: VehicleStatus::Stolen,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&bike).unwrap();
        assert_eq!(json["status"], "STOLEN");
        assert_eq!(json["is_stolen"], true);

        let back: VehicleIdentity = serde_json::from_value(json).unwrap();
        assert_eq!(back, bike);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&VehicleStatus::Stolen).unwrap(), "\"STOLEN\"");
        assert_eq!(VehicleStatus::from_report_exists(false), VehicleStatus::Clean);
    }
}
