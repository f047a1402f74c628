//! Transport Layer
//!
//! Two ways to carry JSON-RPC traffic to an [`ActionsMcpServer`]:
//! - [`StreamTransport`]: one session over a newline-delimited byte stream
//!   (stdin/stdout)
//! - [`SseTransport`]: many concurrent sessions over HTTP, responses pushed
//!   as Server-Sent Events and requests accepted by POST
//!
//! [`ActionsMcpServer`]: crate::ActionsMcpServer

mod session;
mod sse;
mod stream;

pub use session::{SessionId, SessionTable};
pub use sse::SseTransport;
pub use stream::StreamTransport;
