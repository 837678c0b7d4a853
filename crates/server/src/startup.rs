use std::net::SocketAddr;
use std::sync::Arc;

use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use clients::pubsub::PubSubClient;
use clients::spanner::SpannerClient;
use clients::vision::ImageAnnotatorClient;

use crate::observability;
use crate::routes;
use crate::state::{DynAnnotator, DynPublisher, ServerState};

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Public entry: build the full demo app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;

    let annotator: DynAnnotator = Arc::new(ImageAnnotatorClient::new(
        cfg.gcp.vision.endpoint.clone(),
        cfg.gcp.vision.max_results,
    ));
    let pubsub = Arc::new(PubSubClient::new(
        cfg.gcp.pubsub.endpoint.clone(),
        cfg.gcp.project_id.clone(),
    ));
    let spanner = SpannerClient::new(
        cfg.gcp.spanner.endpoint.clone(),
        &cfg.gcp.project_id,
        &cfg.gcp.spanner.instance,
        &cfg.gcp.spanner.database,
    );

    // Bind first so the loopback endpoints know their own address.
    let listener = tokio::net::TcpListener::bind(bind_addr(&cfg.server)?).await?;
    let local = listener.local_addr()?;

    let publisher: DynPublisher = pubsub.clone();
    let state = ServerState {
        annotator,
        publisher,
        topic: cfg.gcp.pubsub.topic.clone(),
        http: reqwest::Client::new(),
        self_base_url: format!("http://{local}"),
    };

    spawn_startup_demos(&cfg, pubsub, spanner);

    let app = routes::build_router(state, build_cors());
    info!(addr = %local, "starting demo server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// The startup demos mirror the application-ready hooks of the demo suite:
/// reseed the structured store, list the relational table, subscribe and
/// publish one greeting. Each runs in its own task and only logs on
/// failure; the HTTP surface comes up regardless.
fn spawn_startup_demos(cfg: &configs::AppConfig, pubsub: Arc<PubSubClient>, spanner: SpannerClient) {
    tokio::spawn(async move {
        match service::seed::seed_reservations(&spanner).await {
            Ok(count) => info!(count, "structured store reseeded"),
            Err(e) => warn!(error = %e, "structured store seed failed"),
        }
    });

    let database_url = cfg.database.url.clone();
    tokio::spawn(async move {
        if database_url.trim().is_empty() {
            info!("no database configured; skipping relational demo");
            return;
        }
        let db = match models::db::connect_to(&database_url).await {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "relational demo could not connect");
                return;
            }
        };
        match service::reservations::log_reservations(&db).await {
            Ok(count) => info!(count, "relational demo listed reservations"),
            Err(e) => warn!(error = %e, "relational demo query failed"),
        }
    });

    pubsub.clone().subscribe(&cfg.gcp.pubsub.subscription, |msg| {
        observability::MESSAGES_RECEIVED_TOTAL.inc();
        info!(message_id = %msg.message_id, "received message {}", msg.text());
    });

    let topic = cfg.gcp.pubsub.topic.clone();
    tokio::spawn(async move {
        if let Err(e) = service::messaging::publish_greeting(pubsub.as_ref(), &topic).await {
            warn!(error = %e, "startup greeting publish failed");
        }
    });
}

/// Entry for the standalone image-analysis service.
pub async fn run_vision() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;
    let annotator: DynAnnotator = Arc::new(ImageAnnotatorClient::new(
        cfg.gcp.vision.endpoint.clone(),
        cfg.gcp.vision.max_results,
    ));

    let listener = tokio::net::TcpListener::bind(bind_addr(&cfg.server)?).await?;
    info!(addr = %listener.local_addr()?, "starting vision service");
    let app = routes::build_vision_router(annotator);
    axum::serve(listener, app).await?;
    Ok(())
}
