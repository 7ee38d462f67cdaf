use serde::{Deserialize, Serialize};

/// One hit of the Nominatim `/search?format=json` endpoint. Coordinates are
/// delivered as strings.
#[derive(Serialize, Deserialize, Debug)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
