use crate::Coordinate;

/// A source of coordinate observations, such as a GPS feed.
///
/// `coordinates()` consumes `self`; the returned stream owns whatever the
/// source needs to keep reporting. The stream ending means the source is
/// done.
pub trait Location: Send + 'static {
    /// Stream of observed coordinates.
    type Coordinates: futures_lite::Stream<Item = Coordinate> + Send;

    fn coordinates(self) -> Self::Coordinates;
}

/// A fixed list of coordinates, reported once each in order.
pub struct Replay(Vec<Coordinate>);

impl Replay {
    #[must_use]
    pub const fn new(coordinates: Vec<Coordinate>) -> Self {
        Self(coordinates)
    }
}

impl Location for Replay {
    type Coordinates = futures_lite::stream::Iter<std::vec::IntoIter<Coordinate>>;

    fn coordinates(self) -> Self::Coordinates {
        futures_lite::stream::iter(self.0)
    }
}
