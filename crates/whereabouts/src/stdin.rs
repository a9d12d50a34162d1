use std::pin::Pin;

use futures_lite::io::AsyncBufReadExt;
use futures_lite::{Stream, StreamExt};
use whereabouts_geocode::{Coordinate, Location};

/// Location source reading one `<lat>,<lng>` per line from stdin.
///
/// Blank lines are ignored; malformed ones are logged and skipped. The
/// source ends with stdin.
pub struct Stdin;

impl Location for Stdin {
    type Coordinates = Pin<Box<dyn Stream<Item = Coordinate> + Send>>;

    fn coordinates(self) -> Self::Coordinates {
        let stdin = blocking::Unblock::new(std::io::stdin());
        let reader = futures_lite::io::BufReader::new(stdin);
        Box::pin(reader.lines().filter_map(|line| {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(%e, "failed to read stdin");
                    return None;
                }
            };
            parse_line(&line)
        }))
    }
}

fn parse_line(line: &str) -> Option<Coordinate> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.parse() {
        Ok(coords) => Some(coords),
        Err(e) => {
            tracing::warn!(line, %e, "skipping malformed coordinate");
            None
        }
    }
}
