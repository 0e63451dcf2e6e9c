//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Dónde viven las motos y los reportes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
    /// Otro despliegue de este servicio, consumido por HTTP
    Remote { base_url: String },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub store_backend: StoreBackend,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub remote_timeout: Duration,
    /// Una sesión de reporte sin actividad durante este tiempo se libera
    pub session_idle_ttl: Duration,
    pub max_report_sessions: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            store_backend: StoreBackend::Memory,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            remote_timeout: Duration::from_secs(10),
            session_idle_ttl: Duration::from_secs(30 * 60),
            max_report_sessions: 10_000,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid number, got '{}'", raw))?,
            None => defaults.port,
        };

        let remote_timeout = match lookup("REGISTRY_API_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("REGISTRY_API_TIMEOUT_SECS must be a number, got '{}'", raw))?,
            ),
            None => defaults.remote_timeout,
        };

        let session_idle_ttl = match lookup("SESSION_IDLE_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SESSION_IDLE_TTL_SECS must be a number, got '{}'", raw))?;
                if secs == 0 {
                    bail!("SESSION_IDLE_TTL_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.session_idle_ttl,
        };

        let max_report_sessions = match lookup("MAX_REPORT_SESSIONS") {
            Some(raw) => {
                let max: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("MAX_REPORT_SESSIONS must be a number, got '{}'", raw))?;
                if max == 0 {
                    bail!("MAX_REPORT_SESSIONS must be greater than zero");
                }
                max
            }
            None => defaults.max_report_sessions,
        };

        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let store_backend = match backend.trim().to_ascii_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?,
            },
            "memory" => StoreBackend::Memory,
            "remote" => StoreBackend::Remote {
                base_url: lookup("REGISTRY_API_URL")
                    .context("REGISTRY_API_URL must be set when STORE_BACKEND=remote")?,
            },
            other => bail!("STORE_BACKEND must be postgres, memory or remote, got '{}'", other),
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: lookup("HOST").unwrap_or(defaults.host),
            store_backend,
            cors_origins,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            remote_timeout,
            session_idle_ttl,
            max_report_sessions,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
