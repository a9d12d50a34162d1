use std::sync::Arc;

use serde::Deserialize;

use crate::Error;

/// Service status marking a usable response.
const STATUS_OK: &str = "OK";

/// One address block returned by the geocoding service.
///
/// The record is kept exactly as the service sent it and serializes back
/// unchanged. Only `types` and `formatted_address` are interpreted; every
/// other field is reachable through [`field`](Self::field).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AddressComponent {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl AddressComponent {
    /// String entries of `types`. A `types` value that is not an array
    /// yields nothing.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("types")
            .and_then(serde_json::Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(serde_json::Value::as_str)
    }

    /// Empty when the service omitted it.
    #[must_use]
    pub fn formatted_address(&self) -> &str {
        self.fields
            .get("formatted_address")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.types().any(|t| t == kind)
    }

    /// Any field of the record, e.g. `place_id` or `geometry`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// The cached outcome of one successful lookup.
///
/// Components are shared, so every query against the same set hands out the
/// same allocations.
pub type ResultSet = Arc<[Arc<AddressComponent>]>;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<AddressComponent>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Interpret a 200 response body.
pub(crate) fn parse(body: &str) -> Result<ResultSet, Error> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("failed to parse geocoding response: {e}")))?;
    if envelope.status != STATUS_OK {
        return Err(Error::Service {
            status: envelope.status,
            message: envelope.error_message,
        });
    }
    Ok(envelope.results.into_iter().map(Arc::new).collect())
}

/// Every component tagged with `kind`, in result order.
#[must_use]
pub fn by_type(results: &[Arc<AddressComponent>], kind: &str) -> Vec<Arc<AddressComponent>> {
    results
        .iter()
        .filter(|addr| addr.has_type(kind))
        .map(Arc::clone)
        .collect()
}

/// The first component tagged with `kind`.
#[must_use]
pub fn first_by_type(
    results: &[Arc<AddressComponent>],
    kind: &str,
) -> Option<Arc<AddressComponent>> {
    results.iter().find(|addr| addr.has_type(kind)).map(Arc::clone)
}
