use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use exn::ResultExt;
use whereabouts_geocode::{Coordinate, Options};

/// Options file looked up under the platform config directory.
const CONFIG_FILE: &str = "config.json";

/// Errors returned while loading configuration.
#[derive(Debug)]
pub struct Error(String);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Error {}

/// Resolve coordinates to postal addresses.
///
/// Reads `<lat>,<lng>` lines from stdin unless a coordinate is given.
#[derive(Debug, clap::Parser)]
#[command(name = "whereabouts", version)]
pub struct Args {
    /// JSON options file. Defaults to `<config dir>/whereabouts/config.json`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Mark requests as coming from a location sensor.
    #[arg(long, overrides_with = "no_sensor")]
    pub sensor: bool,

    /// Clear `sensor` even when the options file sets it.
    #[arg(long, overrides_with = "sensor")]
    pub no_sensor: bool,

    /// Preferred result language.
    #[arg(long)]
    pub language: Option<String>,

    /// Geocoding endpoint URL.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Geocoding API key.
    #[arg(long, env = "WHEREABOUTS_API_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Address types to print for every result set.
    #[arg(long = "type", value_name = "TYPE", default_value = "postal_code")]
    pub kinds: Vec<String>,

    /// Latitude for a one-shot lookup.
    #[arg(allow_negative_numbers = true, requires = "lng")]
    pub lat: Option<f64>,

    /// Longitude for a one-shot lookup.
    #[arg(allow_negative_numbers = true)]
    pub lng: Option<f64>,
}

impl Args {
    /// The coordinate given on the command line, if any.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lng?))
    }
}

/// Build options from the options file, then apply command-line overrides.
///
/// A missing default file is fine; a missing explicit one is not.
pub fn load(args: &Args) -> exn::Result<Options, Error> {
    let mut options = match &args.config {
        Some(path) => read(path)?,
        None => match default_path() {
            Some(path) if path.exists() => read(&path)?,
            _ => Options::default(),
        },
    };

    if args.sensor {
        options.sensor = true;
    } else if args.no_sensor {
        options.sensor = false;
    }
    if let Some(language) = &args.language {
        options.language = Some(language.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        options.endpoint.clone_from(endpoint);
    }
    if let Some(key) = &args.key {
        options.api_key = Some(key.clone());
    }
    Ok(options)
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("whereabouts").join(CONFIG_FILE))
}

fn read(path: &Path) -> exn::Result<Options, Error> {
    let text = fs::read_to_string(path)
        .or_raise(|| Error(format!("read options file {}", path.display())))?;
    let options = serde_json::from_str(&text)
        .or_raise(|| Error(format!("parse options file {}", path.display())))?;
    tracing::debug!(path = %path.display(), "options file loaded");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("whereabouts").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn negative_coordinates() {
        let args = parse(&["--config", "/dev/null", "49.25", "-123.1"]);
        assert_eq!(args.coordinate(), Some(Coordinate::new(49.25, -123.1)));
    }

    #[test]
    fn latitude_requires_longitude() {
        assert!(Args::try_parse_from(["whereabouts", "49.25"]).is_err());
    }

    #[test]
    fn kinds_default_to_postal_code() {
        assert_eq!(parse(&[]).kinds, ["postal_code"]);
        let args = parse(&["--type", "locality", "--type", "country"]);
        assert_eq!(args.kinds, ["locality", "country"]);
        assert_eq!(args.coordinate(), None);
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sensor": false, "language": "fr", "endpoint": "https://example.com/geo"}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let options = load(&parse(&["--config", path, "--sensor", "--key", "k"])).unwrap();
        assert!(options.sensor);
        assert_eq!(options.language.as_deref(), Some("fr"));
        assert_eq!(options.endpoint, "https://example.com/geo");
        assert_eq!(options.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn no_sensor_clears_file_setting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sensor": true}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        assert!(load(&parse(&["--config", path])).unwrap().sensor);
        assert!(!load(&parse(&["--config", path, "--no-sensor"])).unwrap().sensor);
        // The last of the pair wins.
        assert!(load(&parse(&["--config", path, "--no-sensor", "--sensor"])).unwrap().sensor);
        assert!(!load(&parse(&["--config", path, "--sensor", "--no-sensor"])).unwrap().sensor);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let args = parse(&["--config", path.to_str().unwrap()]);
        assert!(load(&args).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "sensor = true").unwrap();
        let args = parse(&["--config", file.path().to_str().unwrap()]);
        assert!(load(&args).is_err());
    }
}
