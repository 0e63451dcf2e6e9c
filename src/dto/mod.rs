//! DTOs de la API HTTP
//!
//! Requests validados con `validator` y respuestas serializables.

pub mod api_response;
pub mod bike_dto;
pub mod report_dto;
pub mod search_dto;
pub mod session_dto;

pub use api_response::ApiResponse;
pub use bike_dto::BikeRequest;
pub use report_dto::ReportTheftRequest;
pub use search_dto::{SearchBikesParams, SearchResponse};
pub use session_dto::{SessionResponse, SessionStepResponse};
