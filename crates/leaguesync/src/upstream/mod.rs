//! Upstream API clients.

mod http;
mod memo;

pub use http::{HttpUpstream, UpstreamRoute};
pub use memo::MemoizedUpstream;
