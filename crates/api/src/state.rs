use std::sync::Arc;
use std::time::Duration;

use radio_db::session::SessionValidator;
use radio_db::RecordStore;
use radio_suno::api::MusicGenerator;
use radio_suno::gateway::PromptEnhancer;
use radio_suno::media::MediaFetcher;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::engine::advancer::RoomAdvancer;
use crate::engine::coordinator::GenerationCoordinator;

/// External services the server talks to besides the BaaS.
///
/// Each is optional: a missing generator or enhancer turns the related
/// endpoints into 503s, and a missing media fetcher skips media storage.
#[derive(Clone, Default)]
pub struct Services {
    pub generator: Option<Arc<dyn MusicGenerator>>,
    pub enhancer: Option<Arc<dyn PromptEnhancer>>,
    pub media: Option<Arc<dyn MediaFetcher>>,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Anonymous BaaS handle; per-user handles come from the session check.
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<ServerConfig>,
    pub sessions: SessionValidator,
    pub enhancer: Option<Arc<dyn PromptEnhancer>>,
    pub coordinator: Arc<GenerationCoordinator>,
    pub advancer: Arc<RoomAdvancer>,
    /// Client used by the pass-through proxy.
    pub http: reqwest::Client,
}

impl AppState {
    /// Wire the engine components around a store and external services.
    pub fn new(config: ServerConfig, store: Arc<dyn RecordStore>, services: Services) -> Self {
        let config = Arc::new(config);
        // Every room mutation goes through this lock.
        let room_lock = Arc::new(Mutex::new(()));

        let coordinator = Arc::new(GenerationCoordinator::new(
            Arc::clone(&store),
            services.generator,
            services.media,
            config.callback_url(),
            config.room_id.clone(),
            Arc::clone(&room_lock),
        ));
        let advancer = Arc::new(RoomAdvancer::new(
            Arc::clone(&store),
            Arc::clone(&coordinator),
            room_lock,
            config.room_id.clone(),
            config.room_play_tag.clone(),
        ));

        Self {
            sessions: SessionValidator::new(Arc::clone(&store), config.require_verified),
            store,
            enhancer: services.enhancer,
            coordinator,
            advancer,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}
