//! API Module
//!
//! HTTP handlers and routing exposing the cache operations over REST.
//!
//! # Endpoints
//! - `PUT /set`, `PUT /mset` - Store one or many values
//! - `GET /get/:key`, `POST /mget` - Retrieve one or many values
//! - `DELETE /del/:key` - Delete a key
//! - `GET /has/:key`, `GET /keys` - Liveness peek and key listing
//! - `POST /invalidate` - Remove entries by tag
//! - `POST /cleanup`, `DELETE /clear` - Sweep expired entries or empty the cache
//! - `GET /stats`, `POST /stats/reset` - Metrics
//! - `GET /export`, `POST /import` - Snapshots
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
