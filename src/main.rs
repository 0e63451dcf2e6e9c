use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use stolen_bike_registry::clients::RegistryApiClient;
use stolen_bike_registry::config::{DatabaseConfig, EnvironmentConfig, StoreBackend};
use stolen_bike_registry::database::{connect, run_migrations};
use stolen_bike_registry::repositories::{MemoryVehicleStore, PgVehicleStore, VehicleStore};
use stolen_bike_registry::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🏍️ Stolen Bike Registry");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let store = build_store(&config).await?;
    let app_state = AppState::new(store, config.clone());
    let sweeper = app_state.spawn_session_sweeper();
    info!(
        "🧹 Sesiones de reporte: caducan tras {}s sin actividad, máximo {}",
        config.session_idle_ttl.as_secs(),
        config.max_report_sessions
    );
    let app = create_router(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🏍️ Motos:");
    info!("   POST /api/bikes - Registrar moto");
    info!("   GET  /api/bikes/:id - Obtener moto");
    info!("   PUT  /api/bikes/:id - Actualizar moto");
    info!("   POST /api/bikes/:id/report_stolen - Reportar robo");
    info!("   GET  /api/search/bikes - Buscar (vin, engine_number, license_plate, search)");
    info!("        filtros: status, make, model, year, color; página: page, page_size");
    info!("   GET  /api/reports - Reportes activos");
    info!("📝 Sesiones de reporte:");
    info!("   POST   /api/report-sessions - Iniciar sesión");
    info!("   GET    /api/report-sessions/:id - Estado de la sesión");
    info!("   DELETE /api/report-sessions/:id - Descartar sesión");
    info!("   POST   /api/report-sessions/:id/vehicle - Paso 1: datos de la moto");
    info!("   POST   /api/report-sessions/:id/back - Volver al paso 1");
    info!("   POST   /api/report-sessions/:id/theft - Paso 2: datos del robo");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    sweeper.abort();
    info!("👋 Servidor terminado");
    Ok(())
}

/// Elegir el store según `STORE_BACKEND`
async fn build_store(config: &EnvironmentConfig) -> Result<Arc<dyn VehicleStore>> {
    match &config.store_backend {
        StoreBackend::Postgres { database_url } => {
            let pool = connect(&DatabaseConfig::from_url(database_url.as_str())).await?;
            run_migrations(&pool).await?;
            info!("🐘 Store: PostgreSQL");
            Ok(Arc::new(PgVehicleStore::new(pool)))
        }
        StoreBackend::Memory => {
            if !config.is_development() {
                warn!("⚠️ Store en memoria fuera de desarrollo: los datos se pierden al reiniciar");
            }
            info!("🧠 Store: memoria");
            Ok(Arc::new(MemoryVehicleStore::new()))
        }
        StoreBackend::Remote { base_url } => {
            let client = RegistryApiClient::new(base_url.as_str(), config.remote_timeout)?;
            info!("🔗 Store: registro remoto en {}", client.base_url());
            Ok(Arc::new(client))
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
