//! API Handlers
//!
//! HTTP request handlers for each item store endpoint.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Form, Json,
};
use serde_json::Value;
use tracing::{error, info};

use super::extract::{ApiPath, ApiQuery};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::models::{HealthResponse, ItemForm, ItemQuery, ServiceInfo};
use crate::relay::RelayHub;
use crate::store::{Item, ItemStore};

const JSON_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Item persistence
    pub store: ItemStore,
    /// Realtime relay handle
    pub relay: RelayHub,
}

impl AppState {
    pub fn new(store: ItemStore, relay: RelayHub) -> Self {
        Self { store, relay }
    }

    /// Creates an AppState over an in-memory store with a loopback relay.
    pub fn in_memory() -> Self {
        Self::new(
            ItemStore::in_memory(),
            RelayHub::loopback(Config::default().mqtt.topic),
        )
    }
}

// == Helpers ==

/// Media type of a Content-Type value, lower-cased and without parameters.
fn media_type(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

/// Rejects requests whose Content-Type is not `expected`.
pub fn check_content_type(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Err(StoreError::BadRequest(
            "Content-Type header is missing".to_string(),
        ));
    };

    if media_type(value).as_deref() == Some(expected) {
        return Ok(());
    }

    error!("Invalid Content-Type: {:?}", value);
    Err(StoreError::UnsupportedMediaType(format!(
        "Content-Type must be {}",
        expected
    )))
}

/// `http://{host}` from the Host header, or empty for relative URLs.
fn base_url(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_default()
}

fn not_found(id: u64) -> StoreError {
    StoreError::NotFound(format!("Item with id '{}' was not found.", id))
}

async fn read_json(request: Request, state: &AppState) -> Result<Value> {
    let Json(value) = Json::<Value>::from_request(request, state)
        .await
        .map_err(|rejection| StoreError::BadRequest(rejection.body_text()))?;
    Ok(value)
}

// == Service Endpoints ==

/// Handler for GET /
pub async fn index_handler(headers: HeaderMap) -> Json<ServiceInfo> {
    Json(ServiceInfo::new(&base_url(&headers)))
}

/// Handler for GET /healthcheck
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.store.ping().await?;
    Ok(Json(HealthResponse::healthy()))
}

// == Item Endpoints ==

/// Handler for GET /items
///
/// Lists all items, or those matching a `price`, `name` or `available` query.
pub async fn list_items(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> Result<Json<Vec<Item>>> {
    let items = match query.criterion()? {
        Some((attribute, value)) => state.store.find_by(attribute, value).await?,
        None => state.store.all().await?,
    };

    Ok(Json(items))
}

/// Handler for GET /items/:id
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Item>> {
    let item = state.store.find(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(item))
}

/// Handler for POST /items
///
/// Accepts a JSON body or an HTML form. Any other body is treated as missing.
pub async fn create_item(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Item>)> {
    let base = base_url(request.headers());
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(media_type);

    let data = match content_type.as_deref() {
        Some(FORM_MEDIA_TYPE) => {
            info!("Getting data from form submit");
            let Form(form) = Form::<ItemForm>::from_request(request, &state)
                .await
                .map_err(|rejection| StoreError::BadRequest(rejection.body_text()))?;
            Some(form.into_payload())
        }
        Some(JSON_MEDIA_TYPE) => {
            info!("Getting data from API call");
            Some(read_json(request, &state).await?)
        }
        _ => None,
    };

    let mut item = Item::default();
    item.apply_payload(data.as_ref())?;
    state.store.save(&mut item).await?;
    info!("Item {} created", item.id);

    let location = format!("{}/items/{}", base, item.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(item),
    ))
}

/// Handler for PUT /items/:id
///
/// Replaces the item's fields and announces the change on the relay.
pub async fn update_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
    request: Request,
) -> Result<Json<Item>> {
    check_content_type(request.headers(), JSON_MEDIA_TYPE)?;

    let mut item = state.store.find(id).await?.ok_or_else(|| not_found(id))?;
    let data = read_json(request, &state).await?;
    item.apply_payload(Some(&data))?;
    item.id = id;
    state.store.save(&mut item).await?;

    state.relay.notify(format!(
        "Price of the Item with id '{}' and name '{}' was changed.",
        id, item.name
    ));
    Ok(Json(item))
}

/// Handler for DELETE /items/:id
///
/// Succeeds whether or not the item exists.
pub async fn delete_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<StatusCode> {
    if let Some(item) = state.store.find(id).await? {
        state.store.delete(&item).await?;
        info!("Item {} deleted", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for PUT /items/:id/purchase
///
/// Purchasing makes an item unavailable; an unavailable item cannot be purchased.
pub async fn purchase_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Item>> {
    let mut item = state.store.find(id).await?.ok_or_else(|| not_found(id))?;

    if !item.available {
        return Err(StoreError::BadRequest(format!(
            "Item with id '{}' is not available.",
            id
        )));
    }

    item.available = false;
    state.store.save(&mut item).await?;
    Ok(Json(item))
}

/// Handler for DELETE /items/reset
///
/// Removes every item and resets id assignment.
pub async fn reset_items(State(state): State<AppState>) -> Result<StatusCode> {
    state.store.remove_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_state() -> AppState {
        let state = AppState::in_memory();
        state
            .store
            .save(&mut Item::new("fido", "dog"))
            .await
            .unwrap();
        state
            .store
            .save(&mut Item::new("kitty", "cat"))
            .await
            .unwrap();
        state
    }

    #[test]
    fn test_media_type_ignores_parameters() {
        let value = HeaderValue::from_static("Application/JSON; charset=utf-8");
        assert_eq!(media_type(&value).as_deref(), Some("application/json"));
    }

    #[test]
    fn test_check_content_type() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            check_content_type(&headers, JSON_MEDIA_TYPE),
            Err(StoreError::BadRequest(_))
        ));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(matches!(
            check_content_type(&headers, JSON_MEDIA_TYPE),
            Err(StoreError::UnsupportedMediaType(_))
        ));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        assert!(check_content_type(&headers, JSON_MEDIA_TYPE).is_ok());
    }

    #[test]
    fn test_base_url() {
        let mut headers = HeaderMap::new();
        assert_eq!(base_url(&headers), "");
        headers.insert(header::HOST, HeaderValue::from_static("localhost:5000"));
        assert_eq!(base_url(&headers), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_get_item_handler() {
        let state = seeded_state().await;

        let response = get_item(State(state.clone()), ApiPath(2)).await.unwrap();
        assert_eq!(response.name, "kitty");

        let result = get_item(State(state), ApiPath(5)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_items_handler() {
        let state = seeded_state().await;

        let all = list_items(State(state.clone()), ApiQuery(ItemQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let query = ItemQuery {
            price: Some("DOG".to_string()),
            ..ItemQuery::default()
        };
        let by_price = list_items(State(state), ApiQuery(query)).await.unwrap();
        assert_eq!(by_price.len(), 1);
        assert_eq!(by_price[0].name, "fido");
    }

    #[tokio::test]
    async fn test_purchase_handler() {
        let state = seeded_state().await;

        let response = purchase_item(State(state.clone()), ApiPath(1)).await.unwrap();
        assert!(!response.available);

        let result = purchase_item(State(state.clone()), ApiPath(1)).await;
        match result {
            Err(StoreError::BadRequest(msg)) => assert!(msg.contains("not available")),
            other => panic!("expected BadRequest, got {:?}", other.map(|j| j.0)),
        }

        let result = purchase_item(State(state), ApiPath(9)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let state = seeded_state().await;

        let status = delete_item(State(state.clone()), ApiPath(2)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let status = delete_item(State(state.clone()), ApiPath(2)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert_eq!(state.store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_handler() {
        let state = seeded_state().await;

        let status = reset_items(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = AppState::in_memory();
        let response = health_handler(State(state)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.message, "Healthy");
    }
}
