use std::{fmt, str::FromStr};

/// One half of a [`Coordinate`].
///
/// Location sources report either numbers or strings. Both are rendered
/// verbatim into the request, so no range checking happens here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Ordinate {
    Number(f64),
    Text(String),
}

impl Ordinate {
    /// Whether this value cannot be written into a `latlng` parameter at all.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Number(n) => !n.is_finite(),
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Ordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Ordinate {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Ordinate {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Ordinate {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A latitude/longitude pair to geocode.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub latitude: Ordinate,
    pub longitude: Ordinate,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: impl Into<Ordinate>, longitude: impl Into<Ordinate>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.latitude.is_degenerate() || self.longitude.is_degenerate()
    }
}

/// Renders as the `latlng` query value, `<lat>,<lng>`.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Error parsing a [`Coordinate`] from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parses `"<lat>,<lng>"` or `"<lat> <lng>"` into numeric ordinates.
impl FromStr for Coordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty());
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError(format!(
                "expected \"<lat>,<lng>\", got {s:?}"
            )));
        };
        let latitude = lat
            .parse::<f64>()
            .map_err(|e| ParseError(format!("invalid latitude {lat:?}: {e}")))?;
        let longitude = lng
            .parse::<f64>()
            .map_err(|e| ParseError(format!("invalid longitude {lng:?}: {e}")))?;
        Ok(Self::new(latitude, longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_numbers_verbatim() {
        assert_eq!(Coordinate::new(49.25, -123.1).to_string(), "49.25,-123.1");
        assert_eq!(
            Coordinate::new(42.358_056, -71.063_611).to_string(),
            "42.358056,-71.063611"
        );
    }

    #[test]
    fn renders_text_verbatim() {
        let coords = Coordinate::new("37.7891094", "-122.3892471");
        assert_eq!(coords.to_string(), "37.7891094,-122.3892471");
    }

    #[test]
    fn out_of_range_is_not_degenerate() {
        assert!(!Coordinate::new(123.0, 400.0).is_degenerate());
    }

    #[test]
    fn empty_and_non_finite_are_degenerate() {
        assert!(Coordinate::new("", "").is_degenerate());
        assert!(Coordinate::new("  ", 1.0).is_degenerate());
        assert!(Coordinate::new(f64::NAN, 1.0).is_degenerate());
        assert!(Coordinate::new(1.0, f64::INFINITY).is_degenerate());
    }

    #[test]
    fn parse_comma_and_space() {
        let expected = Coordinate::new(49.25, -123.1);
        assert_eq!("49.25,-123.1".parse::<Coordinate>().unwrap(), expected);
        assert_eq!("49.25, -123.1".parse::<Coordinate>().unwrap(), expected);
        assert_eq!(" 49.25 -123.1 ".parse::<Coordinate>().unwrap(), expected);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("49.25".parse::<Coordinate>().is_err());
        assert!("49.25,-123.1,7".parse::<Coordinate>().is_err());
        assert!("north,west".parse::<Coordinate>().is_err());
    }

    #[test]
    fn deserialize_mixed_ordinates() {
        let coords: Coordinate =
            serde_json::from_str(r#"{"latitude":"49.25","longitude":-123.1}"#).unwrap();
        assert_eq!(coords.latitude, Ordinate::Text("49.25".into()));
        assert_eq!(coords.longitude, Ordinate::Number(-123.1));
    }
}
