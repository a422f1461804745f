//! HTTP gateway: pages, work request intake and paginated tracker lists

use axum::{
    extract::{FromRequest, OriginalUri, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::{Error, Result, ResultExt};
use crate::intake::WorkRequest;
use crate::pagination::{paginate, Cursors, Page};
use crate::tracker::{TrackerClient, TrackerProject};

/// State shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Cursors of every paginated endpoint
    pub cursors: Cursors,
    /// Tracker client, when a token is configured
    pub tracker: Option<TrackerClient>,
    /// Tracker project work requests are filed in
    pub project: Option<TrackerProject>,
    /// Email domains allowed to submit work requests
    pub domains: Vec<String>,
}

impl AppState {
    /// Build state from configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        // one client, so lists and work requests share a rate limit bucket
        let tracker = config.tracker.client()?;
        let project = tracker
            .clone()
            .and_then(|client| config.tracker.bind_project(client));

        Ok(Self {
            cursors: Cursors::new(),
            tracker,
            project,
            domains: config.domains.clone(),
        })
    }

    fn tracker(&self) -> Result<&TrackerClient> {
        self.tracker.as_ref().ok_or(Error::TrackerUnavailable)
    }

    fn project(&self) -> Result<&TrackerProject> {
        self.project.as_ref().ok_or(Error::TrackerUnavailable)
    }
}

/// Build the gateway router
pub fn router(state: AppState, public_dirs: &[PathBuf]) -> Router {
    let mut app = Router::new()
        .route("/", get(home))
        .route("/download", get(download))
        .route("/request", get(request_form).post(submit_request))
        .route("/projects", get(list_projects))
        .route("/stories", get(list_stories))
        .route("/health", get(health));

    if let Some(files) = public_files(public_dirs) {
        app = app.nest_service("/public", files);
    }

    app.fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve each directory in turn; the first one holding the file wins
fn public_files(dirs: &[PathBuf]) -> Option<Router> {
    dirs.iter().rev().fold(None, |next, dir| {
        let files = ServeDir::new(dir);
        Some(match next {
            Some(next) => Router::new().fallback_service(files.fallback(next)),
            None => Router::new().fallback_service(files),
        })
    })
}

/// Start the HTTP gateway
pub async fn serve(config: GatewayConfig) -> Result<()> {
    for dir in &config.public_dirs {
        tracing::info!("publishing directory: {}", dir.display());
    }
    if config.tracker.project_id.is_none() || config.tracker.token.is_none() {
        tracing::warn!("project tracker not configured; work requests will be refused");
    }

    let state = AppState::from_config(&config)?;
    let app = router(state, &config.public_dirs);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to port {}", config.listen_port))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

// ============================================================================
// Pages
// ============================================================================

const HOME_PAGE: &str = r#"<!doctype html>
<html><head><title>Operations</title></head>
<body>
<h1>Operations</h1>
<ul>
<li><a href="/download">Downloads</a></li>
<li><a href="/request">Submit a work request</a></li>
</ul>
</body></html>
"#;

const DOWNLOAD_PAGE: &str = r#"<!doctype html>
<html><head><title>Downloads</title></head>
<body>
<h1>Downloads</h1>
<p>Published files are available under <a href="/public/">/public/</a>.</p>
</body></html>
"#;

const REQUEST_PAGE: &str = r#"<!doctype html>
<html><head><title>Work request</title></head>
<body>
<h1>Submit a work request</h1>
<form method="post" action="/request">
<label>Email <input type="email" name="email" required></label>
<label>Title <input type="text" name="title"></label>
<label>Description <textarea name="description"></textarea></label>
<button type="submit">Submit</button>
</form>
</body></html>
"#;

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn download() -> Html<&'static str> {
    Html(DOWNLOAD_PAGE)
}

async fn request_form() -> Html<&'static str> {
    Html(REQUEST_PAGE)
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

// ============================================================================
// Work requests
// ============================================================================

/// File a work request as a chore
async fn submit_request(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response> {
    let project = state.project()?;
    let chore = parse_work_request(request).await?.into_chore(&state.domains)?;

    tracing::debug!("creating chore: {}", chore.summary());
    project.create_chore(&chore.name, &chore.description).await?;

    Ok(Redirect::to("/").into_response())
}

/// Decode a JSON body, or a urlencoded form body otherwise
async fn parse_work_request(request: Request) -> Result<WorkRequest> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let Json(work) = Json::<WorkRequest>::from_request(request, &())
            .await
            .map_err(|e| Error::validation(vec![format!("body: {}", e.body_text())]))?;
        return Ok(work);
    }

    let Form(work) = Form::<WorkRequest>::from_request(request, &())
        .await
        .map_err(|e| Error::validation(vec![format!("body: {}", e.body_text())]))?;
    Ok(work)
}

// ============================================================================
// Paginated lists
// ============================================================================

/// Page through every tracker project
async fn list_projects(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Page> {
    paginate(&state.cursors, &uri, || state.tracker()?.projects()).await
}

/// Page through the stories of the configured project
async fn list_stories(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Page> {
    paginate(&state.cursors, &uri, || state.project()?.stories()).await
}
