use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of place that can be searched for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    School,
    College,
    Hospital,
    Hotel,
}

/// Matches elements whose `key` tag equals one of `values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    pub key: &'static str,
    pub values: &'static [&'static str],
}

static TAG_TABLE: [(Category, &[TagRule]); 4] = [
    (
        Category::School,
        &[TagRule {
            key: "amenity",
            values: &["school"],
        }],
    ),
    (
        Category::College,
        &[TagRule {
            key: "amenity",
            values: &["college", "university"],
        }],
    ),
    (
        Category::Hospital,
        &[TagRule {
            key: "amenity",
            values: &["hospital", "clinic"],
        }],
    ),
    (
        Category::Hotel,
        &[TagRule {
            key: "tourism",
            values: &["hotel", "motel", "hostel", "guest_house"],
        }],
    ),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::School,
        Category::College,
        Category::Hospital,
        Category::Hotel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::School => "school",
            Category::College => "college",
            Category::Hospital => "hospital",
            Category::Hotel => "hotel",
        }
    }

    pub fn tag_rules(self) -> &'static [TagRule] {
        TAG_TABLE
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, rules)| *rules)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_rules() {
        for category in Category::ALL {
            assert!(!category.tag_rules().is_empty(), "{category} has no rules");
        }
    }

    #[test]
    fn hotel_matches_tourism_values() {
        let rules = Category::Hotel.tag_rules();
        assert_eq!(rules[0].key, "tourism");
        assert!(rules[0].values.contains(&"guest_house"));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Hospital".parse::<Category>(), Ok(Category::Hospital));
        assert_eq!(
            "museum".parse::<Category>(),
            Err(UnknownCategory("museum".to_owned()))
        );
    }
}
