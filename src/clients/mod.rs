//! Clients - HTTP clients for remote registries
//!
//! This module contains HTTP clients that speak this service's own REST API.

pub mod registry_client;

pub use registry_client::RegistryApiClient;
