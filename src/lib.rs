//! Registro de motos robadas
//!
//! API HTTP para registrar motos, reportarlas como robadas en un flujo de dos
//! pasos y buscar por VIN, número de motor, matrícula o marca/modelo.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
