//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: el store de motos, la configuración y las
//! sesiones abiertas del flujo de reporte.
//!
//! Las sesiones no viven para siempre: una sesión completada se cierra en el
//! mismo request, y una sesión sin actividad durante `session_idle_ttl` se
//! libera (al tocarla, al abrir otra con el registro lleno o en el barrido
//! periódico). El número de sesiones abiertas está acotado por
//! `max_report_sessions`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::VehicleStore;
use crate::services::{ReportWorkflow, SearchService};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Una sesión del flujo; el mutex es el flag de "envío en curso"
pub type SharedWorkflow = Arc<Mutex<ReportWorkflow>>;

pub struct SessionEntry {
    workflow: SharedWorkflow,
    last_touched: Instant,
}

impl SessionEntry {
    fn new(workflow: SharedWorkflow) -> Self {
        Self {
            workflow,
            last_touched: Instant::now(),
        }
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_touched.elapsed() > ttl
    }

    /// Un guard vivo (request en curso) retiene otra referencia al workflow
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.workflow) > 1
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VehicleStore>,
    pub config: EnvironmentConfig,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn VehicleStore>, config: EnvironmentConfig) -> Self {
        Self {
            store,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn search_service(&self) -> SearchService {
        SearchService::new(self.store.clone())
    }

    /// Abrir una sesión nueva en `COLLECTING_VEHICLE_INFO`.
    /// Con el registro lleno se liberan primero las sesiones inactivas.
    pub async fn open_session(&self) -> AppResult<(Uuid, SharedWorkflow)> {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.config.max_report_sessions {
            let released = release_idle(&mut sessions, self.config.session_idle_ttl);
            if released > 0 {
                info!("🧹 {} sesiones inactivas liberadas para abrir una nueva", released);
            }
        }
        if sessions.len() >= self.config.max_report_sessions {
            warn!("🚫 Límite de {} sesiones de reporte alcanzado", self.config.max_report_sessions);
            return Err(AppError::SessionLimitReached);
        }

        let id = Uuid::new_v4();
        let workflow = Arc::new(Mutex::new(ReportWorkflow::new(self.store.clone())));
        sessions.insert(id, SessionEntry::new(workflow.clone()));
        info!("🆕 Sesión de reporte {} abierta ({} activas)", id, sessions.len());

        Ok((id, workflow))
    }

    /// Tomar la sesión para operar sobre ella. Si otro request la tiene
    /// tomada, se rechaza en lugar de esperar. Una sesión ya caducada se
    /// libera aquí mismo y cuenta como inexistente.
    pub async fn lock_session(&self, id: Uuid) -> AppResult<OwnedMutexGuard<ReportWorkflow>> {
        let workflow = {
            let mut sessions = self.sessions.write().await;
            let entry = sessions
                .get_mut(&id)
                .ok_or_else(|| not_found_error("Report session", &id.to_string()))?;

            if entry.is_idle(self.config.session_idle_ttl) && !entry.in_use() {
                sessions.remove(&id);
                info!("⌛ Sesión de reporte {} caducada", id);
                return Err(not_found_error("Report session", &id.to_string()));
            }

            entry.last_touched = Instant::now();
            entry.workflow.clone()
        };

        workflow.try_lock_owned().map_err(|_| {
            debug!("⏳ Sesión {} ocupada", id);
            AppError::SubmissionInProgress
        })
    }

    /// Descartar una sesión; `false` si no existía
    pub async fn close_session(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("🗑️ Sesión de reporte {} cerrada", id);
        }
        removed
    }

    /// Liberar las sesiones sin actividad; devuelve cuántas se cerraron
    pub async fn sweep_idle_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let released = release_idle(&mut sessions, self.config.session_idle_ttl);
        if released > 0 {
            info!("🧹 {} sesiones inactivas liberadas ({} activas)", released, sessions.len());
        }
        released
    }

    /// Barrido periódico de sesiones inactivas, a la mitad del TTL
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = (self.config.session_idle_ttl / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                state.sweep_idle_sessions().await;
            }
        })
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn release_idle(sessions: &mut HashMap<Uuid, SessionEntry>, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| entry.in_use() || !entry.is_idle(ttl));
    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryVehicleStore;

    fn state(ttl_secs: u64, max_sessions: usize) -> AppState {
        let config = EnvironmentConfig {
            session_idle_ttl: Duration::from_secs(ttl_secs),
            max_report_sessions: max_sessions,
            ..EnvironmentConfig::default()
        };
        AppState::new(Arc::new(MemoryVehicleStore::new()), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_swept_and_touched_ones_kept() {
        let state = state(60, 100);
        let (idle, _) = state.open_session().await.unwrap();
        let (active, _) = state.open_session().await.unwrap();

        tokio::time::advance(Duration::from_secs(40)).await;
        drop(state.lock_session(active).await.unwrap());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(state.sweep_idle_sessions().await, 1);
        assert_eq!(state.session_count().await, 1);

        assert!(state.lock_session(active).await.is_ok());
        assert!(matches!(state.lock_session(idle).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_gone_before_any_sweep() {
        let state = state(60, 100);
        let (id, _) = state.open_session().await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(state.lock_session(id).await, Err(AppError::NotFound(_))));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_in_use_survives_sweep() {
        let state = state(60, 100);
        let (id, _) = state.open_session().await.unwrap();
        let guard = state.lock_session(id).await.unwrap();

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(state.sweep_idle_sessions().await, 0);

        drop(guard);
        assert_eq!(state.sweep_idle_sessions().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_rejects_until_idle_sessions_can_go() {
        let state = state(60, 2);
        state.open_session().await.unwrap();
        state.open_session().await.unwrap();

        assert!(matches!(state.open_session().await, Err(AppError::SessionLimitReached)));

        tokio::time::advance(Duration::from_secs(61)).await;
        state.open_session().await.unwrap();
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_releases_abandoned_sessions() {
        let state = state(60, 1000);
        for _ in 0..500 {
            state.open_session().await.unwrap();
        }

        let sweeper = state.spawn_session_sweeper();
        tokio::time::sleep(Duration::from_secs(121)).await;

        assert_eq!(state.session_count().await, 0);
        sweeper.abort();
    }
}
