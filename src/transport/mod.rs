//! HTTP transport shared by the remote completion backends.

mod http;

pub use http::{HttpTransport, TransportError};
