//! Remote execution endpoint protocol
//!
//! This module provides:
//! - Request and result types for `/execute` calls
//! - ExecuteTransport trait for endpoint abstraction
//! - HttpTransport implementation over reqwest

pub mod http;
pub mod transport;
pub mod types;

pub use http::HttpTransport;
pub use transport::{ExecuteTransport, TransportError};
pub use types::{Envelope, ExecuteRequest, InvocationResult};
