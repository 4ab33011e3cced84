//! HTTP routes and handlers for the item API.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::store::{Item, ItemInput, ItemStore};

/// Build the router. `static_dir` is mounted as the fallback when it exists.
pub fn router(store: Arc<ItemStore>, static_dir: &FsPath) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .with_state(store);

    if static_dir.is_dir() {
        tracing::debug!("Serving static files from {:?}", static_dir);
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

type ItemId = Result<Path<i64>, PathRejection>;

/// Negative ids are well-formed but can never name a stored item.
fn item_id(path: ItemId) -> Result<u64, ApiError> {
    let Path(id) = path?;
    u64::try_from(id).map_err(|_| ApiError::NotFound)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to Item Tray" }))
}

async fn list_items(State(store): State<Arc<ItemStore>>) -> Json<Vec<Item>> {
    Json(store.list())
}

async fn get_item(
    State(store): State<Arc<ItemStore>>,
    id: ItemId,
) -> Result<Json<Item>, ApiError> {
    let id = item_id(id)?;
    Ok(Json(store.get(id)?))
}

async fn create_item(
    State(store): State<Arc<ItemStore>>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(input) = body?;
    let item = store.create(input);
    tracing::debug!("Created item {}", item.id);
    Ok(Json(item))
}

async fn update_item(
    State(store): State<Arc<ItemStore>>,
    id: ItemId,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let id = item_id(id)?;
    let Json(input) = body?;
    Ok(Json(store.update(id, input)?))
}

async fn delete_item(
    State(store): State<Arc<ItemStore>>,
    id: ItemId,
) -> Result<impl IntoResponse, ApiError> {
    let id = item_id(id)?;
    store.delete(id)?;
    tracing::debug!("Deleted item {}", id);
    Ok(Json(serde_json::json!({ "message": "Item deleted successfully" })))
}
