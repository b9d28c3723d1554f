//! HTTP API server for the archive frontend.
//!
//! Serves the catalog (listing, search, facets) and proxies chat to the
//! configured language-model backend, either as a single reply or as a
//! server-sent event stream.

use crate::catalog::{Catalog, FacetEntry, LocationGroup, VideoQuery, VideoRecord};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::llm::context::render_system_message;
use crate::llm::{ChatMessage, ContextLoader, Conversation, LlmClient, Role, APOLOGY_MESSAGE};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub catalog: Catalog,
    pub client: LlmClient,
    pub context: ContextLoader,
    pub prompts: Prompts,
    /// History messages kept per `/chat` request.
    pub max_history: usize,
}

impl AppState {
    pub fn from_settings(catalog: Catalog, settings: &Settings) -> anyhow::Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let client = LlmClient::new(settings.llm.clone())?;
        let context = ContextLoader::from_settings(settings, &prompts);

        Ok(Self {
            catalog,
            client,
            context,
            prompts,
            max_history: settings.server.max_history,
        })
    }

    /// Build the full request for one chat turn.
    ///
    /// The context document is fetched per turn so edits to it show up
    /// without a restart. At most `max_history` messages, the new one
    /// included, follow the system message; older exchanges are dropped
    /// whole.
    async fn chat_messages(&self, req: &ChatRequest) -> Vec<ChatMessage> {
        let context = self.context.load().await;

        let mut conversation = Conversation::with_max_messages(self.max_history);
        for message in &req.history {
            match message.role {
                Role::User => conversation.push_user(message.content.clone()),
                Role::Assistant => conversation.push_assistant(message.content.clone()),
                Role::System => {}
            }
        }
        conversation.push_user(req.message.clone());

        let received = req.history.len() + 1;
        if conversation.len() < received {
            debug!("Dropped {} older history messages", received - conversation.len());
        }

        conversation.request(render_system_message(&self.prompts, &context, &req.message))
    }
}

/// Build the API router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/videos", get(list_videos))
        .route("/videos/{id}", get(get_video))
        .route("/search", post(search))
        .route("/facets", get(facets))
        .route("/locations", get(locations))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let catalog = super::load_catalog(&settings)?;
    info!("Loaded {} videos", catalog.videos.len());

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let state = Arc::new(AppState::from_settings(catalog, &settings)?);
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Griot API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Videos", "GET  /videos");
    Output::kv("Get Video", "GET  /videos/:id");
    Output::kv("Search", "POST /search");
    Output::kv("Facets", "GET  /facets");
    Output::kv("Map Locations", "GET  /locations");
    Output::kv("Chat", "POST /chat");
    Output::kv("Chat (SSE)", "POST /chat/stream");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    facets: Vec<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Serialize)]
struct VideoListResponse<'a> {
    videos: Vec<&'a VideoRecord>,
    total: usize,
}

#[derive(Serialize)]
struct FacetsResponse {
    tags: Vec<FacetEntry>,
    people: Vec<FacetEntry>,
    locations: Vec<String>,
}

#[derive(Serialize)]
struct LocationsResponse {
    locations: Vec<LocationGroup>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatResponse {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_videos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let videos = state.catalog.search(&VideoQuery::new());
    Json(VideoListResponse {
        total: videos.len(),
        videos,
    })
    .into_response()
}

async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.get(&id) {
        Some(video) => Json(video).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Video not found: {}", id),
            }),
        )
            .into_response(),
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let query = VideoQuery::new()
        .with_text(req.query)
        .with_facets(req.facets)
        .with_location(req.location);

    let videos = state.catalog.search(&query);
    Json(VideoListResponse {
        total: videos.len(),
        videos,
    })
    .into_response()
}

async fn facets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(FacetsResponse {
        tags: state.catalog.ranked_tags(),
        people: state.catalog.ranked_people(),
        locations: state.catalog.location_names(),
    })
}

async fn locations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(LocationsResponse {
        locations: state.catalog.location_groups(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let messages = state.chat_messages(&req).await;

    match state.client.chat(&messages).await {
        Ok(reply) => Json(ChatResponse {
            content: reply.content,
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!("Chat failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ChatResponse {
                    content: APOLOGY_MESSAGE.to_string(),
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let messages = state.chat_messages(&req).await;
    let (tx, rx) = futures::channel::mpsc::unbounded();

    tokio::spawn(async move {
        state
            .client
            .chat_stream(&messages, |event| {
                // The receiver is gone once the client disconnects.
                let _ = tx.unbounded_send(event);
            })
            .await;
    });

    let events = rx.map(|event| Event::default().json_data(event.to_chunk()));
    Sse::new(events).keep_alive(KeepAlive::default())
}
