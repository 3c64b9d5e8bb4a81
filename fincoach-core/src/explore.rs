//! Nearby-place taxonomy: category → tag predicates, and place tags → display.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoachError;

/// Search radius around the user, in metres.
pub const SEARCH_RADIUS_M: u32 = 2000;

pub const UNNAMED_PLACE: &str = "Unnamed Place";
pub const UNKNOWN_KIND: &str = "unknown";
const FALLBACK_ICON: &str = "📍";

/// Tags checked, in order, for a place's link.
const WEBSITE_TAGS: [&str; 5] = [
    "website",
    "contact:website",
    "url",
    "contact:facebook",
    "contact:instagram",
];

/// Tags checked, in order, for a place's subtype.
const KIND_TAGS: [&str; 3] = ["amenity", "shop", "leisure"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    FastFood,
    Restaurants,
    Grocery,
    Convenience,
    Health,
    General,
    Gym,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 7] = [
        PlaceCategory::FastFood,
        PlaceCategory::Restaurants,
        PlaceCategory::Grocery,
        PlaceCategory::Convenience,
        PlaceCategory::Health,
        PlaceCategory::General,
        PlaceCategory::Gym,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PlaceCategory::FastFood => "fast_food",
            PlaceCategory::Restaurants => "restaurants",
            PlaceCategory::Grocery => "grocery",
            PlaceCategory::Convenience => "convenience",
            PlaceCategory::Health => "health",
            PlaceCategory::General => "general",
            PlaceCategory::Gym => "gym",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaceCategory::FastFood => "Fast Food",
            PlaceCategory::Restaurants => "Restaurants",
            PlaceCategory::Grocery => "Grocery Stores",
            PlaceCategory::Convenience => "Convenience Stores",
            PlaceCategory::Health => "Health Stores",
            PlaceCategory::General => "General Stores",
            PlaceCategory::Gym => "Gyms & Fitness",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PlaceCategory::FastFood => "🍔",
            PlaceCategory::Restaurants => "🍽️",
            PlaceCategory::Grocery => "🛒",
            PlaceCategory::Convenience => "🏪",
            PlaceCategory::Health => "💊",
            PlaceCategory::General => "🏬",
            PlaceCategory::Gym => "💪",
        }
    }

    pub fn predicates(&self) -> Vec<TagPredicate> {
        use TagPredicate as P;
        match self {
            PlaceCategory::FastFood => vec![
                P::eq("amenity", "fast_food"),
                P::eq("amenity", "street_food"),
            ],
            // only budget-friendly restaurants
            PlaceCategory::Restaurants => vec![
                P::eq("amenity", "restaurant").and(TagCondition::Present("cheap".into())),
                P::eq("amenity", "restaurant")
                    .and(TagCondition::Equals("price".into(), "cheap".into())),
                P::eq("amenity", "restaurant")
                    .and(TagCondition::Equals("price".into(), "low".into())),
            ],
            PlaceCategory::Grocery => vec![
                P::eq("shop", "supermarket"),
                P::eq("shop", "greengrocer"),
                P::eq("shop", "grocery"),
            ],
            PlaceCategory::Convenience => vec![P::eq("shop", "convenience")],
            PlaceCategory::Health => vec![
                P::eq("shop", "health_food"),
                P::eq("shop", "herbalist"),
                P::eq("shop", "nutrition_supplements"),
                P::eq("amenity", "pharmacy"),
            ],
            PlaceCategory::General => vec![
                P::eq("shop", "general"),
                P::eq("shop", "department_store"),
                P::eq("shop", "variety_store"),
            ],
            PlaceCategory::Gym => vec![
                P::eq("leisure", "fitness_centre"),
                P::eq("leisure", "sports_centre"),
                P::eq("amenity", "gym"),
            ],
        }
    }
}

/// What the user picked in the explore menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategorySelection {
    #[default]
    All,
    Only(PlaceCategory),
}

impl CategorySelection {
    pub fn categories(&self) -> Vec<PlaceCategory> {
        match self {
            CategorySelection::All => PlaceCategory::ALL.to_vec(),
            CategorySelection::Only(c) => vec![*c],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategorySelection::All => "All Places",
            CategorySelection::Only(c) => c.label(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CategorySelection::All => "🗺️",
            CategorySelection::Only(c) => c.icon(),
        }
    }
}

impl FromStr for CategorySelection {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "all" {
            return Ok(CategorySelection::All);
        }
        PlaceCategory::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .map(CategorySelection::Only)
            .ok_or_else(|| CoachError::InvalidInput(format!("unknown place category '{s}'")))
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelection::All => f.write_str("all"),
            CategorySelection::Only(c) => f.write_str(c.slug()),
        }
    }
}

/// An extra tag requirement on top of the main key=value match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagCondition {
    Present(String),
    Equals(String, String),
}

/// One `node[key=value]...` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPredicate {
    pub key: String,
    pub value: String,
    pub extra: Option<TagCondition>,
}

impl TagPredicate {
    pub fn eq(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            extra: None,
        }
    }

    pub fn and(mut self, cond: TagCondition) -> Self {
        self.extra = Some(cond);
        self
    }

    /// Does a tag map satisfy this predicate?
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        if tags.get(&self.key) != Some(&self.value) {
            return false;
        }
        match &self.extra {
            None => true,
            Some(TagCondition::Present(k)) => tags.contains_key(k),
            Some(TagCondition::Equals(k, v)) => tags.get(k) == Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A structured search handed to the geo-search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub center: GeoPoint,
    pub radius_m: u32,
    pub predicates: Vec<TagPredicate>,
}

impl PlaceQuery {
    /// Render as Overpass QL.
    pub fn to_overpass_ql(&self) -> String {
        let GeoPoint {
            latitude,
            longitude,
        } = self.center;
        let mut out = String::from("[out:json];\n(\n");
        for p in &self.predicates {
            out.push_str(&format!("  node[\"{}\"=\"{}\"]", p.key, p.value));
            match &p.extra {
                Some(TagCondition::Present(k)) => out.push_str(&format!("[\"{k}\"]")),
                Some(TagCondition::Equals(k, v)) => out.push_str(&format!("[\"{k}\"=\"{v}\"]")),
                None => {}
            }
            out.push_str(&format!(
                "(around:{}, {latitude}, {longitude});\n",
                self.radius_m
            ));
        }
        out.push_str(");\nout tags center;\n");
        out
    }
}

/// Build the query for `selection` centred on `center`. `All` is the union
/// of every category, in taxonomy order.
pub fn build_query(selection: CategorySelection, center: GeoPoint, radius_m: u32) -> PlaceQuery {
    let predicates = selection
        .categories()
        .iter()
        .flat_map(|c| c.predicates())
        .collect();
    PlaceQuery {
        center,
        radius_m,
        predicates,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawCenter {
    pub lat: f64,
    pub lon: f64,
}

/// One element as returned by the geo-search backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<RawCenter>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    /// Raw subtype tag value, e.g. `supermarket`.
    pub kind: String,
    pub location: Option<GeoPoint>,
    pub website: Option<String>,
}

impl Place {
    pub fn display(&self) -> PlaceDisplay {
        place_display(&self.kind)
    }

    /// A map search link for this place.
    pub fn maps_url(&self) -> Option<String> {
        self.location.map(|p| {
            format!(
                "https://www.google.com/maps/search/?api=1&query={},{}",
                p.latitude, p.longitude
            )
        })
    }
}

fn non_empty<'a>(tags: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    tags.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
}

pub fn normalize_place(raw: &RawPlace) -> Place {
    let tags = &raw.tags;
    let name = non_empty(tags, "name").unwrap_or(UNNAMED_PLACE).to_string();
    let kind = KIND_TAGS
        .iter()
        .find_map(|k| non_empty(tags, k))
        .unwrap_or(UNKNOWN_KIND)
        .to_string();
    let location = match (raw.lat, raw.lon, raw.center) {
        (Some(lat), Some(lon), _) => Some(GeoPoint::new(lat, lon)),
        (_, _, Some(c)) => Some(GeoPoint::new(c.lat, c.lon)),
        _ => None,
    };
    let website = WEBSITE_TAGS
        .iter()
        .find_map(|k| non_empty(tags, k))
        .map(str::to_string);
    Place {
        name,
        kind,
        location,
        website,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDisplay {
    pub label: String,
    pub icon: &'static str,
}

/// Subtype → human label and icon. Unknown subtypes show as themselves.
pub fn place_display(kind: &str) -> PlaceDisplay {
    let (label, icon) = match kind {
        "fast_food" => ("Fast Food", "🍔"),
        "street_food" => ("Street Food", "🍔"),
        "restaurant" => ("Restaurant", "🍽️"),
        "supermarket" => ("Supermarket", "🛒"),
        "convenience" => ("Convenience Store", "🏪"),
        "grocery" => ("Grocery", "🥬"),
        "greengrocer" => ("Greengrocer", "🥬"),
        "health_food" => ("Health Food Store", "💊"),
        "herbalist" => ("Herbalist", "💊"),
        "nutrition_supplements" => ("Nutrition Supplements", "💊"),
        "pharmacy" => ("Pharmacy", "⚕️"),
        "general" => ("General Store", "🏬"),
        "department_store" => ("Department Store", "🏬"),
        "variety_store" => ("Variety Store", "🏬"),
        "fitness_centre" => ("Fitness Centre", "💪"),
        "sports_centre" => ("Sports Centre", "💪"),
        "gym" => ("Gym", "💪"),
        other => {
            return PlaceDisplay {
                label: other.to_string(),
                icon: FALLBACK_ICON,
            };
        }
    };
    PlaceDisplay {
        label: label.to_string(),
        icon,
    }
}

/// The last explore search and what it found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlaces {
    pub selection: CategorySelection,
    pub center: GeoPoint,
    pub places: Vec<Place>,
}
