//! Integration and unit tests for snap3d.
//!
//! ## Test Modules
//!
//! - **multipart_tests**: Multipart body decoding and boundary parsing
//! - **scene_tests**: The glTF quad document
//! - **store_tests**: Scan ids, artifact storage and path containment
//! - **reconstruction_tests**: Remote job client against a mock service
//! - **api_tests**: HTTP endpoints through the full router
//! - **error_tests**: Error responses and conversions
//! - **config_tests**: Configuration loading and validation
//!
//! Individual test modules can be run with:
//! ```bash
//! cargo test api_tests
//! ```

pub mod support;

pub mod api_tests;
