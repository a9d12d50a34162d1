pub mod isahc;

use std::future::Future;
use std::pin::Pin;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// An in-flight request.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Response, String>> + Send>>;

/// Issues GET requests for the geocoder.
///
/// Preparing the request happens synchronously in [`get`](Self::get), so a
/// request that cannot be built is reported before anything is sent. The
/// returned future owns everything it needs and runs on the geocoder's
/// executor.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> Result<ResponseFuture, String>;
}
