//! HTTP request layer shared by every backend call.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, TransportError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
