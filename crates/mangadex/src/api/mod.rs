//! MangaDex API client implementation.
//!
//! This module provides the HTTP transport seam, the session token
//! lifecycle and typed wrappers around the library endpoints.

pub mod client;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{group_by_status, ApiSettings, MangadexClient};
pub use session::{Credentials, Session, SessionSettings};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
pub use types::*;
