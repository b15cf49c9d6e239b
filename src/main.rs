mod core;
mod features;
mod modules;
mod shared;

use std::sync::Arc;

use axum::Router;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{Config, StorageConfig};
use crate::core::openapi::ApiDoc;
use crate::core::{database, middleware};
use crate::features::files::{routes as files_routes, FileService, PgFileRepository};
use crate::modules::storage::{BlobStorage, DiskStorage, ObjectStorage};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env BEFORE initializing the logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed");

    // Storage backend: local disk served statically, or an S3-compatible store
    let storage: Arc<dyn BlobStorage> = match &config.storage {
        StorageConfig::Disk(disk) => {
            let storage = DiskStorage::create(&disk.upload_dir)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize disk storage: {}", e))?;
            tracing::info!("Disk storage initialized at {}", disk.upload_dir.display());
            Arc::new(storage)
        }
        StorageConfig::Object(object) => {
            let storage = ObjectStorage::new(object.clone())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize object storage: {}", e))?;
            Arc::new(storage)
        }
    };

    let repo = Arc::new(PgFileRepository::new(pool.clone()));
    let file_service = Arc::new(FileService::new(repo, storage));
    tracing::info!("File service initialized");

    let swagger = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }

    let mut app = Router::new()
        .merge(swagger)
        .merge(files_routes::routes(file_service))
        .route("/health", axum::routing::get(health_check));

    // Locally stored bytes are also reachable directly, as their recorded
    // locations advertise
    if let StorageConfig::Disk(disk) = &config.storage {
        app = app.nest_service("/uploads", ServeDir::new(&disk.upload_dir));
    }

    let app = app
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use a client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
