use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::models::vehicle::{current_year, BikeType, VehicleDraft};
use crate::utils::validation::non_blank;

// Request para registrar o actualizar una moto
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BikeRequest {
    #[validate(length(equal = 17, message = "VIN must be exactly 17 characters"))]
    pub vin: String,

    #[validate(length(min = 1, max = 50))]
    pub engine_number: String,

    #[validate(length(max = 20))]
    #[serde(default)]
    pub license_plate: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub make: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100))]
    #[serde(default = "current_year")]
    pub year: i32,

    #[validate(length(max = 50))]
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub bike_type: BikeType,
}

impl BikeRequest {
    /// Espacios recortados; las longitudes se miden sobre el valor recortado
    pub fn trimmed(self) -> Self {
        Self {
            vin: self.vin.trim().to_string(),
            engine_number: self.engine_number.trim().to_string(),
            license_plate: non_blank(self.license_plate),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            color: non_blank(self.color),
            ..self
        }
    }

    /// Recorta, valida y devuelve el borrador listo para el store
    pub fn validated(self) -> Result<VehicleDraft, ValidationErrors> {
        let request = self.trimmed();
        request.validate()?;
        Ok(request.into_draft())
    }

    /// Borrador normalizado (VIN en mayúsculas, espacios recortados)
    pub fn into_draft(self) -> VehicleDraft {
        VehicleDraft {
            vin: self.vin,
            engine_number: self.engine_number,
            license_plate: self.license_plate,
            make: self.make,
            model: self.model,
            year: self.year,
            color: self.color,
            bike_type: self.bike_type,
        }
        .normalized()
    }
}
