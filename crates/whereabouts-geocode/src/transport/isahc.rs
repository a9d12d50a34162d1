use std::{fmt, time::Duration};

use exn::ResultExt;
use isahc::prelude::*;
use isahc::Request;

use super::{Response, ResponseFuture, Transport};

const TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("whereabouts/", env!("CARGO_PKG_VERSION"));

/// Errors returned when setting up the `isahc` backend.
#[derive(Debug)]
pub struct Error(String);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Error {}

/// [`Transport`] backed by a shared `isahc` client.
///
/// Every request carries a timeout, so a stalled service settles the lookup
/// with a transport error instead of leaving it pending.
#[derive(Clone)]
pub struct Backend {
    client: isahc::HttpClient,
}

impl Backend {
    pub fn new() -> exn::Result<Self, Error> {
        let client = isahc::HttpClient::new().or_raise(|| Error("create HTTP client".into()))?;
        Ok(Self { client })
    }
}

impl Transport for Backend {
    fn get(&self, url: &str) -> Result<ResponseFuture, String> {
        let request = Request::get(url)
            .timeout(TIMEOUT)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .body(())
            .map_err(|e| format!("build request for {url}: {e}"))?;

        let client = self.client.clone();
        Ok(Box::pin(async move {
            let mut response = client
                .send_async(request)
                .await
                .map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| e.to_string())?;
            Ok(Response { status, body })
        }))
    }
}
