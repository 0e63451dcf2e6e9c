use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::theft_report::TheftReportDraft;
use crate::utils::validation::deserialize_local_datetime;

// Request para reportar una moto como robada
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportTheftRequest {
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub last_seen_location: String,

    /// `YYYY-MM-DDTHH:MM` tal como lo manda un `datetime-local`
    #[validate(required(message = "last_seen_date is required"))]
    #[serde(default, deserialize_with = "deserialize_local_datetime")]
    pub last_seen_date: Option<NaiveDateTime>,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub police_report_number: Option<String>,

    #[validate(length(min = 1, max = 20))]
    #[serde(default)]
    pub contact_phone: String,

    #[serde(default)]
    pub additional_details: Option<String>,
}

impl ReportTheftRequest {
    pub fn into_draft(self) -> TheftReportDraft {
        TheftReportDraft {
            last_seen_location: self.last_seen_location,
            last_seen_date: self.last_seen_date,
            police_report_number: self.police_report_number,
            contact_phone: self.contact_phone,
            additional_details: self.additional_details,
        }
        .normalized()
    }
}
