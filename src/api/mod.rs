//! REST API over the enriched book list
//!
//! | Method   | Path             | Auth        | Success |
//! |----------|------------------|-------------|---------|
//! | `GET`    | `/`              |             | 200     |
//! | `GET`    | `/books`         |             | 200     |
//! | `POST`   | `/books`         | `X-API-KEY` | 201     |
//! | `DELETE` | `/books/{title}` | `X-API-KEY` | 204     |

pub mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiSettings;
use crate::database::{BookStore, JsonFileStorage};
use crate::models::Book;

pub use error::ApiError;

/// Header carrying the shared secret on mutating requests
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookStore>,
    api_key: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<BookStore>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            api_key: api_key.into(),
        }
    }
}

/// Proof that the request carried the right `X-API-KEY`.
///
/// Taken before the body, so a bad key is rejected even for a malformed payload.
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if key == &*state.api_key => Ok(Self),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookFilter {
    pub country: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/books", get(list_books).post(create_book))
        .route("/books/{title}", delete(delete_book))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Books API is running. Try GET /books" }))
}

async fn list_books(State(state): State<AppState>, Query(filter): Query<BookFilter>) -> Json<Vec<Book>> {
    Json(state.store.list(filter.country.as_deref()).await)
}

async fn create_book(
    State(state): State<AppState>,
    _key: ApiKey,
    Json(book): Json<Book>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.store.create(book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn delete_book(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(title): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&title).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load the store and serve the API until Ctrl-C.
pub async fn serve(settings: &ApiSettings) -> Result<()> {
    let store = BookStore::open(JsonFileStorage::new(&settings.store_file))
        .with_context(|| format!("failed to load {}", settings.store_file.display()))?;

    let state = AppState::new(Arc::new(store), settings.api_key.as_str());
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP API server listening on http://{}", settings.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
