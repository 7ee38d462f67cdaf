use tracing::instrument;

use crate::{
    error::Result,
    overpass::AdminArea,
    search::SearchService,
    types::{Place, SearchRequest},
};

pub const CSV_HEADERS: [&str; 10] = [
    "category",
    "name",
    "phone",
    "email",
    "website",
    "address",
    "latitude",
    "longitude",
    "osm_id",
    "raw_tags",
];

pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Runs a fresh search for `request` and renders it as CSV.
#[instrument(skip(service, request), fields(location = %request.location))]
pub async fn export(service: &SearchService, request: &SearchRequest) -> Result<CsvExport> {
    let result = service.search(request).await?;
    Ok(CsvExport {
        filename: export_filename(&result.location_label),
        bytes: write_csv(&result.results)?,
    })
}

/// Statewide export of every category inside `area`.
#[instrument(skip(service, area), fields(area = area.name))]
pub async fn export_area(
    service: &SearchService,
    area: &AdminArea,
    with_email_enrichment: bool,
) -> Result<CsvExport> {
    let places = service.search_area(area, with_email_enrichment).await?;
    Ok(CsvExport {
        filename: export_filename(area.slug),
        bytes: write_csv(&places)?,
    })
}

/// One row per place; the header row is written even when `places` is empty.
pub fn write_csv(places: &[Place]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for place in places {
        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let osm_id = place.osm_id.to_string();
        let raw_tags = serde_json::to_string(&place.raw_tags)?;
        writer.write_record([
            place.category.as_str(),
            place.name.as_deref().unwrap_or_default(),
            place.phone.as_deref().unwrap_or_default(),
            place.email.as_deref().unwrap_or_default(),
            place.website.as_deref().unwrap_or_default(),
            place.address.as_deref().unwrap_or_default(),
            latitude.as_str(),
            longitude.as_str(),
            osm_id.as_str(),
            raw_tags.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()).into())
}

pub fn export_filename(label: &str) -> String {
    let stem: String = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ',' | '-'))
        .collect();
    if stem.is_empty() {
        "findyourplace.csv".to_owned()
    } else {
        format!("findyourplace_{stem}.csv")
    }
}
