use std::collections::BTreeMap;

use crate::types::{Category, Place, RawElement};

const NAME_KEYS: [&str; 3] = ["name", "official_name", "brand"];
const PHONE_KEYS: [&str; 2] = ["phone", "contact:phone"];
const EMAIL_KEYS: [&str; 2] = ["email", "contact:email"];
const WEBSITE_KEYS: [&str; 3] = ["website", "contact:website", "url"];
const ADDRESS_PART_KEYS: [&str; 5] = [
    "addr:housenumber",
    "addr:street",
    "addr:city",
    "addr:postcode",
    "addr:state",
];
const ADDRESS_FULL_KEY: &str = "addr:full";
const ADDRESS_SEPARATOR: &str = ", ";

/// Value of the first key present with a non-blank value.
fn first_tag(tags: &BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| tag(tags, key).map(str::to_owned))
}

fn tag<'a>(tags: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    tags.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn address(tags: &BTreeMap<String, String>) -> Option<String> {
    let parts: Vec<&str> = ADDRESS_PART_KEYS.iter().filter_map(|key| tag(tags, key)).collect();
    if parts.is_empty() {
        tag(tags, ADDRESS_FULL_KEY).map(str::to_owned)
    } else {
        Some(parts.join(ADDRESS_SEPARATOR))
    }
}

/// Maps an element's tag bag onto a [`Place`]. Missing fields stay `None`; the
/// full tag map is carried over unchanged.
pub fn normalize(raw: RawElement, category: Category) -> Place {
    let tags = &raw.tags;
    Place {
        osm_id: raw.osm_id,
        category,
        name: first_tag(tags, &NAME_KEYS),
        phone: first_tag(tags, &PHONE_KEYS),
        email: first_tag(tags, &EMAIL_KEYS),
        website: first_tag(tags, &WEBSITE_KEYS),
        address: address(tags),
        latitude: raw.coordinate.latitude,
        longitude: raw.coordinate.longitude,
        raw_tags: raw.tags,
    }
}
