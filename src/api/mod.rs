//! API Module
//!
//! HTTP handlers and routing for the item store REST API.
//!
//! # Endpoints
//! - `GET /items` - List or query items
//! - `POST /items` - Create an item
//! - `GET|PUT|DELETE /items/:id` - Read, replace or remove an item
//! - `PUT /items/:id/purchase` - Mark an item unavailable
//! - `DELETE /items/reset` - Remove all items
//! - `GET /healthcheck` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{ApiPath, ApiQuery};
pub use handlers::*;
pub use routes::create_router;
