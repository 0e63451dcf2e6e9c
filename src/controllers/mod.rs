pub mod bike_controller;
pub mod report_session_controller;

pub use bike_controller::BikeController;
pub use report_session_controller::ReportSessionController;
