//! # Snap3D Backend Library
//!
//! Turns a handful of phone photos into a shareable 3D/AR preview link.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server and routing
//! - **Tokio**: Async runtime; reconstruction polling suspends only its own request
//! - **Reqwest**: Client for the optional remote image-to-3D job service
//! - **Serde**: JSON APIs and glTF scene documents
//!
//! ## Core Components
//!
//! - [`multipart`]: Byte-exact decoding of `multipart/form-data` uploads
//! - [`scene`]: Minimal glTF documents (a textured quad) used as fallback models
//! - [`store`]: Per-scan artifact storage with path containment
//! - [`reconstruction`]: Job creation, polling and request-shape fallbacks
//! - [`pipeline`]: Scan creation and model retrieval built on the above
//! - [`routes`]: HTTP endpoint handlers and the router
//! - [`config`]: Layered configuration
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`metrics`], [`middleware`], [`state`], [`types`]: Supporting pieces

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod multipart;
pub mod pipeline;
pub mod reconstruction;
pub mod routes;
pub mod scene;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
