//! Reverse geocoding with a cache of the latest result set.
//!
//! [`Geocode`] turns coordinates into address components through a remote
//! service, keeps the most recent successful answer, and answers queries
//! by address type against it.

pub mod address;
pub mod coordinate;
mod events;
pub mod location;
pub mod options;
pub mod transport;

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use futures_lite::StreamExt;

pub use address::{AddressComponent, ResultSet};
pub use coordinate::{Coordinate, Ordinate};
pub use events::Subscription;
pub use location::Location;
pub use options::Options;
pub use transport::Transport;

/// Ways a lookup can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request could not be built or handed to the transport.
    Request(String),
    /// The transport failed to complete the exchange.
    Transport(String),
    /// The service answered with a non-200 HTTP status.
    Status(u16),
    /// The service answered 200 with a body that is not valid JSON.
    Parse(String),
    /// The service answered 200 but reported a status other than `OK`.
    Service {
        status: String,
        message: Option<String>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "request error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Status(status) => write!(f, "geocoding service returned HTTP {status}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Service {
                status,
                message: Some(message),
            } => write!(f, "geocoding service reported {status}: {message}"),
            Self::Service {
                status,
                message: None,
            } => write!(f, "geocoding service reported {status}"),
        }
    }
}

impl std::error::Error for Error {}

struct State {
    options: Options,
    results: Option<ResultSet>,
}

struct Shared {
    executor: Arc<async_executor::Executor<'static>>,
    transport: Box<dyn Transport>,
    state: Mutex<State>,
    geocoded: events::Notifier<ResultSet>,
    errors: events::Notifier<Error>,
}

/// Reverse geocoder holding the latest successful result set.
///
/// Cloneable; all clones share options, cache and subscribers. Requests run
/// on the executor passed to [`Geocode::new`], which the caller must drive.
#[derive(Clone)]
pub struct Geocode {
    shared: Arc<Shared>,
}

impl Geocode {
    #[must_use]
    pub fn new(
        executor: Arc<async_executor::Executor<'static>>,
        transport: impl Transport,
        options: Options,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                executor,
                transport: Box::new(transport),
                state: Mutex::new(State {
                    options,
                    results: None,
                }),
                geocoded: events::Notifier::new(),
                errors: events::Notifier::new(),
            }),
        }
    }

    /// Geocode `coords`.
    ///
    /// The request is dispatched before this returns, using the options as
    /// they are right now. On success the cache is replaced and `geocode`
    /// subscribers are notified. A request that cannot be built is rejected
    /// immediately and also reported to `error` subscribers; every other
    /// failure only settles the returned [`Lookup`].
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn lookup(&self, coords: &Coordinate) -> Lookup {
        let options = self.options();
        let pending = options
            .request_url(coords)
            .and_then(|url| self.shared.transport.get(&url).map_err(Error::Request));
        let pending = match pending {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(latlng = %coords, %e, "geocode request not dispatched");
                self.shared.errors.emit(e.clone());
                return Lookup {
                    state: LookupState::Rejected(Some(e)),
                };
            }
        };
        tracing::debug!(latlng = %coords, sensor = options.sensor, "geocode request dispatched");

        let shared = Arc::clone(&self.shared);
        let latlng = coords.to_string();
        let task = self.shared.executor.spawn(async move {
            let outcome = settle(&shared, pending.await);
            if let Err(e) = &outcome {
                tracing::warn!(%latlng, %e, "geocode lookup failed");
            }
            outcome
        });
        Lookup {
            state: LookupState::Running(Some(task)),
        }
    }

    /// Look up every coordinate `source` reports, as it reports it.
    ///
    /// Dropping the returned [`Watch`] stops following the source; lookups
    /// already issued still run to completion.
    #[must_use]
    pub fn follow<L: Location>(&self, source: L) -> Watch {
        let this = self.clone();
        let task = self.shared.executor.spawn(async move {
            let coordinates = source.coordinates();
            futures_lite::pin!(coordinates);
            let mut in_flight: Vec<Lookup> = Vec::new();
            while let Some(coords) = coordinates.next().await {
                tracing::trace!(latlng = %coords, "coordinate observed");
                in_flight.retain(|lookup| !lookup.is_finished());
                in_flight.push(this.lookup(&coords));
            }
            tracing::debug!(pending = in_flight.len(), "location source ended");
            for lookup in in_flight {
                let _ = lookup.await;
            }
        });
        Watch { task }
    }

    /// Every cached address component tagged with `kind`, in result order.
    ///
    /// Empty until a lookup has succeeded.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn addresses_by_type(&self, kind: &str) -> Vec<Arc<AddressComponent>> {
        self.results()
            .map(|results| address::by_type(&results, kind))
            .unwrap_or_default()
    }

    /// The first cached address component tagged with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn address_by_type(&self, kind: &str) -> Option<Arc<AddressComponent>> {
        self.results()
            .and_then(|results| address::first_by_type(&results, kind))
    }

    /// The cached result set, if any lookup has succeeded.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn results(&self) -> Option<ResultSet> {
        self.shared.state.lock().expect("poisoned").results.clone()
    }

    /// Snapshot of the current options.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn options(&self) -> Options {
        self.shared.state.lock().expect("poisoned").options.clone()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sensor(&self) -> bool {
        self.shared.state.lock().expect("poisoned").options.sensor
    }

    /// Affects lookups issued after this call only.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_sensor(&self, sensor: bool) {
        self.shared.state.lock().expect("poisoned").options.sensor = sensor;
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .expect("poisoned")
            .options
            .language
            .clone()
    }

    /// Stored for callers; not sent to the service.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_language(&self, language: Option<String>) {
        self.shared.state.lock().expect("poisoned").options.language = language;
    }

    /// Every result set cached from now on.
    #[must_use]
    pub fn on_geocode(&self) -> Subscription<ResultSet> {
        self.shared.geocoded.subscribe()
    }

    /// The next result set cached after this call.
    pub fn once_geocode(&self) -> impl Future<Output = Option<ResultSet>> + Send + 'static {
        self.shared.geocoded.subscribe().once()
    }

    /// Every lookup rejected before dispatch from now on.
    #[must_use]
    pub fn on_error(&self) -> Subscription<Error> {
        self.shared.errors.subscribe()
    }

    /// The next lookup rejected before dispatch after this call.
    pub fn once_error(&self) -> impl Future<Output = Option<Error>> + Send + 'static {
        self.shared.errors.subscribe().once()
    }
}

/// Interpret a finished exchange, caching and announcing a usable result.
fn settle(
    shared: &Shared,
    response: Result<transport::Response, String>,
) -> Result<ResultSet, Error> {
    let response = response.map_err(Error::Transport)?;
    if response.status != 200 {
        return Err(Error::Status(response.status));
    }
    let results = address::parse(&response.body)?;

    // Store and announce under one guard so the last event always matches
    // the cache, even when lookups settle on different threads.
    let mut state = shared.state.lock().expect("poisoned");
    state.results = Some(Arc::clone(&results));
    shared.geocoded.emit(Arc::clone(&results));
    drop(state);
    tracing::info!(count = results.len(), "geocode results cached");
    Ok(results)
}

enum LookupState {
    Rejected(Option<Error>),
    Running(Option<async_executor::Task<Result<ResultSet, Error>>>),
}

/// Outcome of one [`Geocode::lookup`].
///
/// Dropping it does not cancel the request: the cache and subscribers are
/// still updated when the response arrives.
#[must_use = "the request runs regardless; await the lookup to see its outcome"]
pub struct Lookup {
    state: LookupState,
}

impl Lookup {
    /// Whether the outcome is already available.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &self.state {
            LookupState::Rejected(_) | LookupState::Running(None) => true,
            LookupState::Running(Some(task)) => task.is_finished(),
        }
    }
}

impl Future for Lookup {
    type Output = Result<ResultSet, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            LookupState::Rejected(error) => {
                let error = error.take().expect("lookup polled after completion");
                Poll::Ready(Err(error))
            }
            LookupState::Running(slot) => {
                let task = slot.as_mut().expect("lookup polled after completion");
                let outcome = futures_lite::ready!(Pin::new(task).poll(cx));
                *slot = None;
                Poll::Ready(outcome)
            }
        }
    }
}

impl Drop for Lookup {
    fn drop(&mut self) {
        if let LookupState::Running(slot) = &mut self.state {
            if let Some(task) = slot.take() {
                task.detach();
            }
        }
    }
}

/// Handle to a location source being followed by [`Geocode::follow`].
///
/// Dropping the handle stops following.
pub struct Watch {
    task: async_executor::Task<()>,
}

impl Watch {
    /// Wait until the source ends and every lookup it triggered has settled.
    pub async fn done(self) {
        self.task.await;
    }

    /// Keep following for as long as the source reports.
    pub fn detach(self) {
        self.task.detach();
    }
}
