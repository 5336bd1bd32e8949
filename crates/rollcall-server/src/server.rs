use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use rollcall_auth::{IntrospectionVerifier, Principal, StaticTokenVerifier, TokenVerifier};
use rollcall_cache::{
    AttendanceCacheService, CacheStore, HttpSystemOfRecord, MemoryStore, RedisStore,
};
use rollcall_sync::{OfflineSyncQueue, WebhookSink};

use crate::config::{AppConfig, AuthMode};
use crate::realtime::{RealtimeBroadcaster, attendance_ws_handler};
use crate::state::AppState;
use crate::{handlers, observability};

pub struct RollcallServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        // Attendance REST surface
        .route("/attendance/data", get(handlers::get_data))
        .route("/attendance/student", get(handlers::get_student))
        .route("/attendance/mark", post(handlers::mark_attendance))
        .route(
            "/attendance/invalidate/{class_id}/{student_id}",
            delete(handlers::invalidate_student),
        )
        .route(
            "/attendance/invalidate/class/{class_id}",
            delete(handlers::invalidate_class),
        )
        // Real-time surface
        .route("/attendance/ws", get(attendance_ws_handler))
        // Middleware stack
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<RollcallServer> {
        let cfg = self.config;

        let store: Arc<dyn CacheStore> = if cfg.redis.enabled {
            let store = RedisStore::connect(
                &cfg.redis.url,
                cfg.redis.pool_size,
                std::time::Duration::from_millis(cfg.redis.timeout_ms),
            )
            .map_err(|e| anyhow::anyhow!("redis store initialization failed: {e}"))?;
            tracing::info!(url = %cfg.redis.url, "using redis cache store");
            Arc::new(store)
        } else {
            tracing::info!("redis disabled, using in-memory cache store");
            Arc::new(MemoryStore::new())
        };

        let records = Arc::new(HttpSystemOfRecord::new(
            cfg.fallback
                .base_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("fallback.base_url is required"))?,
        ));

        let verifier: Arc<dyn TokenVerifier> = match cfg.auth.mode {
            AuthMode::Introspection => {
                let endpoint = cfg
                    .auth
                    .introspection_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("auth.introspection_url is required"))?;
                Arc::new(IntrospectionVerifier::new(endpoint))
            }
            AuthMode::Static => Arc::new(StaticTokenVerifier::new(
                cfg.auth.static_tokens.iter().map(|entry| {
                    (entry.token.clone(), Principal::new(entry.subject.clone()))
                }),
            )),
        };

        let sink = Arc::new(WebhookSink::new(
            cfg.sync
                .sink_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("sync.sink_url is required"))?,
        ));

        let state = AppState {
            cache: Arc::new(AttendanceCacheService::new(
                store,
                records,
                cfg.ttl_policy(),
            )),
            queue: Arc::new(OfflineSyncQueue::new()),
            sink,
            verifier,
            broadcaster: Arc::new(RealtimeBroadcaster::new()),
            metrics: observability::init_metrics(),
        };

        let app = build_app(state, cfg.server.body_limit_bytes);

        Ok(RollcallServer {
            addr: cfg.addr(),
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RollcallServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
