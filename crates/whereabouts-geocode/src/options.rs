use std::fmt::Write as _;

use crate::{Coordinate, Error};

/// Google reverse geocoding endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Request options, read each time a lookup is issued.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Options {
    /// Whether the coordinates come from a location sensor.
    pub sensor: bool,
    /// Preferred result language. Stored but not sent yet.
    pub language: Option<String>,
    /// Base URL requests are sent to.
    pub endpoint: String,
    /// API key, sent as `key` when set.
    pub api_key: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sensor: false,
            language: None,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            api_key: None,
        }
    }
}

impl Options {
    /// Build the request URL for `coords`.
    ///
    /// Fails for coordinates that cannot form a `latlng` value.
    pub(crate) fn request_url(&self, coords: &Coordinate) -> Result<String, Error> {
        if coords.is_degenerate() {
            return Err(Error::Request(format!(
                "cannot geocode degenerate coordinates {:?},{:?}",
                coords.latitude.to_string(),
                coords.longitude.to_string(),
            )));
        }
        let mut url = format!(
            "{}?latlng={}&sensor={}",
            self.endpoint,
            percent_encode(&coords.to_string()),
            self.sensor
        );
        if let Some(key) = &self.api_key {
            let _ = write!(url, "&key={}", percent_encode(key));
        }
        Ok(url)
    }
}

/// Percent-encode a query parameter value. Commas are left readable.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b',' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert!(!options.sensor);
        assert_eq!(options.language, None);
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn url_carries_latlng_and_sensor() {
        let url = Options::default()
            .request_url(&Coordinate::new(49.25, -123.1))
            .unwrap();
        assert_eq!(
            url,
            "https://maps.googleapis.com/maps/api/geocode/json?latlng=49.25,-123.1&sensor=false"
        );
    }

    #[test]
    fn url_omits_language() {
        let options = Options {
            sensor: true,
            language: Some("fr".into()),
            ..Options::default()
        };
        let url = options.request_url(&Coordinate::new(1.0, 2.0)).unwrap();
        assert!(url.ends_with("?latlng=1,2&sensor=true"));
        assert!(!url.contains("language"));
    }

    #[test]
    fn url_appends_encoded_key() {
        let options = Options {
            api_key: Some("a b/c".into()),
            ..Options::default()
        };
        let url = options.request_url(&Coordinate::new(1.0, 2.0)).unwrap();
        assert!(url.ends_with("&sensor=false&key=a+b%2Fc"));
    }

    #[test]
    fn url_encodes_text_ordinates() {
        let url = Options::default()
            .request_url(&Coordinate::new("1&x=2", "3"))
            .unwrap();
        assert!(url.contains("latlng=1%26x%3D2,3&"));
    }

    #[test]
    fn degenerate_coordinates_are_request_errors() {
        let err = Options::default()
            .request_url(&Coordinate::new("", ""))
            .unwrap_err();
        assert!(matches!(err, Error::Request(_)));
    }

    #[test]
    fn deserialize_partial() {
        let options: Options = serde_json::from_str(r#"{"sensor":true}"#).unwrap();
        assert!(options.sensor);
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
    }
}
