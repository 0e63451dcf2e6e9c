//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Formatos aceptados para la fecha del último avistamiento
/// (el `datetime-local` de los formularios no trae segundos)
const LOCAL_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar y convertir string a fecha/hora local (sin zona horaria)
pub fn parse_local_datetime(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = value.trim();
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"YYYY-MM-DDTHH:MM[:SS]".to_string());
            error
        })
}

/// `serde` helper: `null`, ausente o `""` => `None`
pub fn deserialize_local_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => parse_local_datetime(&value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid local datetime '{}'", value))),
        _ => Ok(None),
    }
}

/// Opcionales de formulario: `Some("  ")` cuenta como ausente
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("E123").is_ok());
        assert!(validate_not_empty("").is_err());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_parse_local_datetime() {
        let short = parse_local_datetime("2024-01-01T10:00").unwrap();
        let long = parse_local_datetime("2024-01-01T10:00:00").unwrap();
        assert_eq!(short, long);
        assert!(parse_local_datetime("2024-01-01T10:00:30.250").is_ok());
        assert!(parse_local_datetime("01/01/2024 10:00").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" AB-12 ".to_string())), Some("AB-12".to_string()));
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
