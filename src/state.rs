use crate::market::backend::{DEFAULT_HTTP_BASE_URL, DEFAULT_WS_BASE_URL};
use crate::market::events::EventBus;
use crate::market::persistence::{UiPreferencesSnapshot, DEFAULT_LOCALE, DEFAULT_THEME};
use crate::market::pipeline::{ConnectionSettings, SharedMarketState};
use crate::market::types::{PairRegistry, StreamStatusSnapshot, DEFAULT_PAIR};
use parking_lot::Mutex;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Process-scope UI state the original kept as ambient globals behind
/// cookies/localStorage. Held explicitly here; persistence happens through
/// the preferences adapter on save, not as a side effect of reads.
#[derive(Debug, Clone)]
pub struct UiSettings {
    pub theme: String,
    pub locale: String,
    pub http_base_url: String,
    pub ws_base_url: String,
    pub auth_token: Option<String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            http_base_url: DEFAULT_HTTP_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            auth_token: None,
        }
    }
}

impl UiSettings {
    pub fn apply_preferences(&mut self, preferences: &UiPreferencesSnapshot) {
        self.theme = preferences.theme.clone();
        self.locale = preferences.locale.clone();
    }
}

pub struct StreamHandle {
    pub cancellation_token: CancellationToken,
    pub join_handle: JoinHandle<()>,
}

/// The explicit application context every operation takes; nothing in the
/// crate reads global mutable state.
pub struct AppState {
    pub started_at: Instant,
    pub db_pool: SqlitePool,
    pub pairs: PairRegistry,
    pub events: EventBus,
    pub settings: parking_lot::RwLock<UiSettings>,
    pub market: Arc<Mutex<SharedMarketState>>,
    pub stream: tokio::sync::Mutex<Option<StreamHandle>>,
    pub stream_status: Arc<RwLock<StreamStatusSnapshot>>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        let stream_status = StreamStatusSnapshot::stopped(
            DEFAULT_PAIR.to_string(),
            Some("stream idle".to_string()),
        );

        Self {
            started_at: Instant::now(),
            db_pool,
            pairs: PairRegistry::builtin(),
            events: EventBus::new(),
            settings: parking_lot::RwLock::new(UiSettings::default()),
            market: Arc::new(Mutex::new(SharedMarketState::default())),
            stream: tokio::sync::Mutex::new(None),
            stream_status: Arc::new(RwLock::new(stream_status)),
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        let settings = self.settings.read();
        ConnectionSettings {
            http_base_url: settings.http_base_url.clone(),
            ws_base_url: settings.ws_base_url.clone(),
        }
    }
}
