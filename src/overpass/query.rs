use std::fmt::Write;

use crate::types::{Coordinate, TagRule};

const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

/// Upper bound on the result size of a statewide query, in bytes.
const AREA_MAXSIZE: u64 = 2_000_000_000;

/// An administrative boundary relation, looked up by exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminArea {
    pub name: &'static str,
    pub admin_level: u8,
    /// Lower-case slug used in export file names.
    pub slug: &'static str,
}

impl AdminArea {
    pub const CALIFORNIA: AdminArea = AdminArea {
        name: "California",
        admin_level: 4,
        slug: "california",
    };
}

fn value_regex(values: &[&str]) -> String {
    let alternatives: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
    format!("^({})$", alternatives.join("|"))
}

fn push_clauses(query: &mut String, rules: &[TagRule], filter: &str) {
    for rule in rules {
        let values = value_regex(rule.values);
        for kind in ELEMENT_KINDS {
            // Writing into a String cannot fail.
            let _ = writeln!(
                query,
                "  {kind}[\"{key}\"~\"{values}\"]({filter});",
                key = rule.key,
            );
        }
    }
}

/// Overpass QL selecting every element matching any of `rules` within
/// `radius_m` metres of `origin`. Ways and relations report their center.
pub fn build_around_query(
    origin: Coordinate,
    radius_m: u32,
    rules: &[TagRule],
    timeout_secs: u64,
) -> String {
    let filter = format!(
        "around:{radius_m},{lat},{lon}",
        lat = origin.latitude,
        lon = origin.longitude,
    );
    let mut query = format!("[out:json][timeout:{timeout_secs}];\n(\n");
    push_clauses(&mut query, rules, &filter);
    query.push_str(");\nout tags center qt;\n");
    query
}

/// Overpass QL selecting every element matching any of `rules` inside the
/// boundary of `area`.
pub fn build_admin_area_query(area: &AdminArea, rules: &[TagRule], timeout_secs: u64) -> String {
    let mut query = format!("[out:json][timeout:{timeout_secs}][maxsize:{AREA_MAXSIZE}];\n");
    let _ = writeln!(
        query,
        r#"rel["name"="{name}"]["boundary"="administrative"]{level}->.boundary;"#,
        name = area.name.replace('"', r#"\""#),
        level = format_args!(r#"["admin_level"="{}"]"#, area.admin_level),
    );
    query.push_str("area.boundary->.searchArea;\n(\n");
    push_clauses(&mut query, rules, "area.searchArea");
    query.push_str(");\nout tags center qt;\n");
    query
}
