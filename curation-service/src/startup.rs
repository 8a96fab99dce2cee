use crate::config::{CurationConfig, StorageBackend, StoreBackend};
use crate::handlers::{
    admin, artworks, auth, chat, contact, content, exhibitions, generation, health, notices,
};
use crate::middleware::{auth_middleware, optional_auth_middleware};
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::providers::imagen::ImagenProvider;
use crate::services::providers::mock::{MockImageProvider, MockTextProvider, MockVisionProvider};
use crate::services::providers::{ImageProvider, TextProvider, VisionProvider};
use crate::services::{
    AuthProvider, BucketStorage, CurationStore, GoTrueAuthProvider, JwtService, LocalStorage,
    MemoryStore, MockAuthProvider, MongoStore, ObjectStorage, ReferenceLibrary,
};
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use service_core::config::is_production;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::rate_limit::{
    IpRateLimiter, create_ip_rate_limiter, ip_rate_limit_middleware,
};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{REQUEST_ID_HEADER, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CurationConfig>,
    pub store: Arc<dyn CurationStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub jwt: JwtService,
    pub auth: Arc<dyn AuthProvider>,
    pub text: Arc<dyn TextProvider>,
    pub vision: Arc<dyn VisionProvider>,
    pub images: Arc<dyn ImageProvider>,
    pub library: Arc<ReferenceLibrary>,
    pub login_rate_limiter: IpRateLimiter,
    pub signup_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Connect the store and storage and construct providers from config.
    pub async fn from_config(config: CurationConfig) -> Result<Self, AppError> {
        let store: Arc<dyn CurationStore> = match config.store {
            StoreBackend::Mongo => {
                let db = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let storage: Arc<dyn ObjectStorage> = match config.storage.backend {
            StorageBackend::Local => Arc::new(
                LocalStorage::new(&config.storage.local_path, &config.storage.public_base_url)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to initialize local storage at {}: {}",
                            config.storage.local_path,
                            e
                        );
                        AppError::ConfigError(anyhow::Error::new(e))
                    })?,
            ),
            StorageBackend::Bucket => {
                let (Some(url), Some(bucket)) = (&config.storage.bucket_url, &config.storage.bucket)
                else {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "Bucket storage needs STORAGE_BUCKET_URL and STORAGE_BUCKET"
                    )));
                };
                Arc::new(
                    BucketStorage::new(
                        url.as_str(),
                        bucket.as_str(),
                        config.storage.service_key.clone().unwrap_or_default(),
                        config.storage.public_base_url.as_str(),
                    )
                    .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?,
                )
            }
        };

        let jwt = JwtService::new(&config.auth.jwt_secret).map_err(AppError::ConfigError)?;

        let auth: Arc<dyn AuthProvider> = if config.auth.provider_url.is_empty() && !is_production()
        {
            tracing::warn!("AUTH_PROVIDER_URL is empty; using the in-process account store");
            Arc::new(MockAuthProvider::new(jwt.clone()))
        } else {
            Arc::new(
                GoTrueAuthProvider::new(&config.auth.provider_url, &config.auth.anon_key)
                    .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?,
            )
        };

        let (text, vision, images) = build_providers(&config)?;

        let library = match &config.rag.library_path {
            Some(path) => ReferenceLibrary::from_file(path).map_err(|e| {
                tracing::error!("Failed to load reference library from {}: {}", path, e);
                AppError::ConfigError(e)
            })?,
            None => ReferenceLibrary::builtin(),
        };
        tracing::info!(passages = library.len(), "Reference library loaded");

        Ok(Self {
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.window_seconds,
            ),
            signup_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signup_attempts,
                config.rate_limit.window_seconds,
            ),
            config: Arc::new(config),
            store,
            storage,
            jwt,
            auth,
            text,
            vision,
            images,
            library: Arc::new(library),
        })
    }
}

type Providers = (
    Arc<dyn TextProvider>,
    Arc<dyn VisionProvider>,
    Arc<dyn ImageProvider>,
);

fn build_providers(config: &CurationConfig) -> Result<Providers, AppError> {
    let api_key = config.google.api_key.trim();
    if api_key.is_empty() {
        tracing::warn!("GOOGLE_API_KEY is not set; AI features use offline mock providers");
        return Ok((
            Arc::new(MockTextProvider::new(true)),
            Arc::new(MockVisionProvider::default()),
            Arc::new(MockImageProvider::new(true)),
        ));
    }

    let text = GeminiProvider::new(GeminiConfig {
        api_key: api_key.to_string(),
        model: config.models.text_model.clone(),
    })?;
    let vision = GeminiProvider::new(GeminiConfig {
        api_key: api_key.to_string(),
        model: config.models.vision_model.clone(),
    })?;
    let images = ImagenProvider::new(api_key.to_string(), config.models.image_model.clone())?;

    tracing::info!(
        text_model = %config.models.text_model,
        vision_model = %config.models.vision_model,
        image_model = %config.models.image_model,
        "Gemini providers configured"
    );
    Ok((Arc::new(text), Arc::new(vision), Arc::new(images)))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(
            allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let signup_route = Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let login_route = Router::new()
        .route("/auth/login", post(auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Public reads that reveal more to an authenticated owner or admin.
    let viewer_routes = Router::new()
        .route("/exhibitions/:id", get(exhibitions::get_exhibition))
        .route("/exhibitions/:id/artworks", get(artworks::list_artworks))
        .route("/exhibitions/:id/content", get(content::list_content))
        .route("/exhibitions/:id/gallery", get(content::gallery))
        .route("/notices/:id", get(notices::get_notice))
        .layer(from_fn_with_state(state.clone(), optional_auth_middleware));

    let authenticated_routes = Router::new()
        .route("/me/exhibitions", get(exhibitions::list_mine))
        .route("/exhibitions", post(exhibitions::create_exhibition))
        .route(
            "/exhibitions/:id",
            patch(exhibitions::update_exhibition).delete(exhibitions::delete_exhibition),
        )
        .route(
            "/exhibitions/:id/duplicate",
            post(exhibitions::duplicate_exhibition),
        )
        .route("/exhibitions/:id/artworks", post(artworks::create_artwork))
        .route("/exhibitions/:id/images", get(artworks::list_images))
        .route(
            "/artworks/:id",
            patch(artworks::update_artwork).delete(artworks::delete_artwork),
        )
        .route("/artworks/:id/analyze", post(artworks::analyze_artwork))
        .route("/exhibitions/:id/content", put(content::upsert_content))
        .route(
            "/exhibitions/:id/content/:content_id",
            axum::routing::delete(content::delete_content),
        )
        .route("/chat", post(chat::chat))
        .route("/generate/titles", post(generation::generate_titles))
        .route(
            "/exhibitions/:id/generate/content",
            post(generation::generate_content),
        )
        .route(
            "/exhibitions/:id/generate/poster",
            post(generation::generate_poster),
        )
        .route("/admin/inquiries", get(admin::list_inquiries))
        .route("/admin/inquiries/:id", patch(admin::update_inquiry))
        .route(
            "/admin/notices",
            get(admin::list_all_notices).post(admin::create_notice),
        )
        .route(
            "/admin/notices/:id",
            patch(admin::update_notice).delete(admin::delete_notice),
        )
        .route("/admin/registrations", get(admin::list_registrations))
        .route(
            "/admin/registrations/:id/read",
            post(admin::mark_registration_read),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/metrics", get(health::metrics_endpoint))
        .route("/exhibitions/public", get(exhibitions::list_public))
        .route("/contact", post(contact::submit_inquiry))
        .route("/notices", get(notices::list_notices))
        .merge(signup_route)
        .merge(login_route)
        .merge(viewer_routes)
        .merge(authenticated_routes);

    if state.config.storage.backend == StorageBackend::Local {
        app = app.nest_service("/files", ServeDir::new(&state.config.storage.local_path));
    }

    let cors = cors_layer(&state.config.allowed_origins);

    app.with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

pub struct Application {
    port: u16,
    server: Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
}

impl Application {
    pub async fn build(config: CurationConfig) -> Result<Self, AppError> {
        let port = config.common.port;
        let state = AppState::from_config(config).await?;
        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(async move { server.await }),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
