//! HTTP host for the hierarchy tree control.

use anyhow::Context as _;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use hierarchy_tree::config::{ConfigStore, LocaleConfig};
use hierarchy_tree::dom::Document;
use hierarchy_tree::html;
use hierarchy_tree::parser::ParseError;
use hierarchy_tree::view::{self, TreeView};
use hierarchy_tree::widget::{Context, Dictionary, HierarchyTree, StandardControl};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CONFIG_DIR: &str = "configs";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    configs: Arc<ConfigStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hierarchy_tree=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_dir = std::env::var("HIERARCHY_TREE_CONFIG_DIR")
        .unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let configs = ConfigStore::load_or_builtin(std::path::Path::new(&config_dir))?;
    info!("Loaded {} locales: {:?}", configs.list().len(), configs.list());

    let state = AppState {
        configs: Arc::new(configs),
    };

    let addr = std::env::var("HIERARCHY_TREE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locales", get(list_locales))
        .route("/render", post(render_html))
        .route("/tree", post(render_tree))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List available locales.
async fn list_locales(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.configs.list())
}

#[derive(serde::Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

fn locale_config(
    state: &AppState,
    query: &LocaleQuery,
) -> Result<Arc<LocaleConfig>, (StatusCode, String)> {
    state.configs.resolve(query.locale.as_deref()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!(
                "Unknown locale: {}. Available: {:?}",
                query.locale.as_deref().unwrap_or_default(),
                state.configs.list()
            ),
        )
    })
}

/// Run the control once over the request body and return its markup.
///
/// Empty bodies and malformed JSON still answer 200: the control shows its
/// placeholder or error message in place, like it would inside a form.
async fn render_html(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
    body: String,
) -> Result<Html<String>, (StatusCode, String)> {
    let config = locale_config(&state, &query)?;

    let mut container = Document::new("div");
    let root = container.root();
    container.set_attribute(root, "id", format!("hierarchy-tree-{}", Uuid::new_v4().simple()));
    container.add_class(root, "hierarchy-tree");

    let mut control = HierarchyTree::new(config);
    control.init(
        &Context::with_data(Some(body)),
        Box::new(|| {}),
        Dictionary::new(),
        container,
    );
    let markup = control.container().map(html::to_html).unwrap_or_default();
    debug!("Rendered {} bytes of markup", markup.len());
    control.destroy();

    Ok(Html(markup))
}

/// Return the declarative tree for the request body.
async fn render_tree(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
    body: String,
) -> Result<Json<TreeView>, (StatusCode, String)> {
    let config = locale_config(&state, &query)?;

    match view::build_view(Some(&body)) {
        Ok(tree) => Ok(Json(tree)),
        Err(ParseError::NoData) => Ok(Json(TreeView::default())),
        Err(error) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            config.messages.describe(&error),
        )),
    }
}
