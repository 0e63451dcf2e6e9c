//! Modelo de reporte de robo
//!
//! Un reporte pertenece a exactamente una moto (1:1) y solo puede existir
//! después de que la moto tenga `id` asignado por el store.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::utils::validation::{deserialize_local_datetime, non_blank, validate_not_empty};

/// Datos del robo tal como los rellena el propietario
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TheftReportDraft {
    #[serde(default)]
    pub last_seen_location: String,
    #[serde(default, deserialize_with = "deserialize_local_datetime")]
    pub last_seen_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub police_report_number: Option<String>,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub additional_details: Option<String>,
}

impl TheftReportDraft {
    pub fn new(
        last_seen_location: impl Into<String>,
        last_seen_date: NaiveDateTime,
        contact_phone: impl Into<String>,
    ) -> Self {
        Self {
            last_seen_location: last_seen_location.into(),
            last_seen_date: Some(last_seen_date),
            police_report_number: None,
            contact_phone: contact_phone.into(),
            additional_details: None,
        }
    }

    pub fn with_police_report_number(mut self, number: impl Into<String>) -> Self {
        self.police_report_number = Some(number.into());
        self
    }

    pub fn with_additional_details(mut self, details: impl Into<String>) -> Self {
        self.additional_details = Some(details.into());
        self
    }

    /// Ubicación, fecha y teléfono son obligatorios
    pub fn check_required(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(error) = validate_not_empty(&self.last_seen_location) {
            errors.add("last_seen_location", error);
        }
        if self.last_seen_date.is_none() {
            errors.add("last_seen_date", ValidationError::new("required"));
        }
        if let Err(error) = validate_not_empty(&self.contact_phone) {
            errors.add("contact_phone", error);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            last_seen_location: self.last_seen_location.trim().to_string(),
            last_seen_date: self.last_seen_date,
            police_report_number: non_blank(self.police_report_number),
            contact_phone: self.contact_phone.trim().to_string(),
            additional_details: non_blank(self.additional_details),
        }
    }
}

/// Reporte de robo persistido
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TheftReport {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub last_seen_location: String,
    pub last_seen_date: NaiveDateTime,
    pub police_report_number: Option<String>,
    pub contact_phone: String,
    pub additional_details: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_draft_reports_all_required_fields() {
        let errors = TheftReportDraft::default().check_required().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains_key("last_seen_location"));
        assert!(fields.contains_key("last_seen_date"));
        assert!(fields.contains_key("contact_phone"));
    }

    #[test]
    fn test_draft_from_form_json() {
        let draft: TheftReportDraft = serde_json::from_str(
            r#"{
                "last_seen_location": "5th Ave",
                "last_seen_date": "2024-01-01T10:00",
                "police_report_number": "",
                "contact_phone": "555-1234"
            }"#,
        )
        .unwrap();
        let draft = draft.normalized();

        assert!(draft.check_required().is_ok());
        assert_eq!(draft.police_report_number, None);
        assert_eq!(
            draft.last_seen_date.unwrap().to_string(),
            "2024-01-01 10:00:00"
        );
    }

    #[test]
    fn test_missing_date_in_json_is_a_validation_failure_not_a_parse_failure() {
        let draft: TheftReportDraft =
            serde_json::from_str(r#"{"last_seen_location":"Dock 4","contact_phone":"555"}"#)
                .unwrap();
        let errors = draft.check_required().unwrap_err();
        assert!(errors.field_errors().contains_key("last_seen_date"));
    }
}
