pub mod category;
pub mod coordinate;
pub mod nominatim;
pub mod overpass;
pub mod place;
pub mod search;

pub use category::{Category, TagRule};
pub use coordinate::{Coordinate, GeocodeResult};
pub use place::{ElementKind, OsmId, Place, RawElement};
pub use search::{CategoryWarning, SearchRequest, SearchRequestBody, SearchResult};
