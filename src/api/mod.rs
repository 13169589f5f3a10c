//! API Module
//!
//! HTTP handlers and routing for the cache service.
//!
//! # Endpoints
//! - `POST /responses/lookup`, `PUT /responses` - generated responses by descriptor
//! - `PUT /entries`, `GET /entries/:key`, `DELETE /entries/:key` - raw entries
//! - `POST /clear`, `PATCH /config` - administration
//! - `GET /stats`, `GET /snapshot`, `GET /health` - observation

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
