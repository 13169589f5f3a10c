//! Request and Response models for the cache service API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{validate_descriptor, CacheResponseRequest, SetRequest};
pub use responses::{DeleteResponse, GetResponse, HealthResponse, MessageResponse, SetResponse};
