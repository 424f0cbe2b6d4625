//! BotVS / FMZ platform API client library.
//!
//! Provides signed RPC access to the platform's `api/v1` endpoint with
//! optional time-windowed memoization of successful results.

pub mod auth;
pub mod cache;
pub mod rpc;
pub mod transport;

pub use auth::{BotvsAuth, NonceSource, SignedRequest};
pub use cache::{cache_key, RpcCache};
pub use rpc::{CallOptions, RpcClient};
pub use transport::{HttpResponse, HttpTransport, Transport};
