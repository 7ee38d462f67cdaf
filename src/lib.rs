//! Points of interest around a free-text location, aggregated from
//! OpenStreetMap via Nominatim and Overpass.

pub mod clients;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod geocode;
pub mod net;
pub mod normalize;
pub mod overpass;
pub mod routes;
pub mod search;
pub mod types;

#[cfg(test)]
mod testing;
