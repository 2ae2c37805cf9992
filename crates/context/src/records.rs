//! Typed records for every source kind, and normalisation of raw live
//! API mappings into them.
//!
//! Live adapters hand back loosely-shaped JSON. Each target field declares
//! an ordered list of [`FieldPath`]s; the first path that resolves to a
//! non-blank scalar wins, otherwise the field default applies. This runs
//! once per raw record, at ingest.
//!
//! Canonical priority orders:
//!
//! | Record | Field | Paths, in order | Default |
//! |--------|-------|-----------------|---------|
//! | LiveJob | title | `title` | `""` |
//! | LiveJob | description | `description` | `""` |
//! | LiveJob | location | `location.display_name`, `location` | `Remote` |
//! | LiveJob | company | `company.display_name`, `company` | `Unknown Company` |
//! | LiveJob | url | `redirect_url`, `url` | `""` |
//! | LiveEvent | name | `name` | `""` |
//! | LiveEvent | description | `description`, `info`, `pleaseNote` | `""` |
//! | LiveEvent | date | `date`, `dates.start.localDate`+`localTime`, `start.localDate`+`localTime` | `Date not available` |
//! | LiveEvent | venue | `venue`, `_embedded.venues.0.name` | `Venue not specified` |
//! | LiveEvent | url | `url` | `""` |

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A job from the local CSV corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company: String,
}

/// A session from the local JSON corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub title: String,
    pub description: String,
    pub date: String,
}

/// A job returned by a live job-search source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company: String,
    pub url: String,
    /// Provider label, e.g. "Adzuna"
    pub source: String,
}

/// An event returned by a live events source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub name: String,
    pub description: String,
    pub date: String,
    pub venue: String,
    pub url: String,
}

pub const DEFAULT_JOB_LOCATION: &str = "Remote";
pub const DEFAULT_COMPANY: &str = "Unknown Company";
pub const DEFAULT_EVENT_DATE: &str = "Date not available";
pub const DEFAULT_VENUE: &str = "Venue not specified";

/// A path into a JSON document. Numeric segments index arrays.
#[derive(Debug, Clone, Copy)]
pub struct FieldPath(pub &'static [&'static str]);

impl FieldPath {
    /// Resolve the path to a trimmed, non-blank string.
    ///
    /// Strings, numbers and booleans are accepted; objects, arrays and
    /// nulls do not resolve.
    pub fn resolve(&self, value: &Value) -> Option<String> {
        let mut current = value;
        for segment in self.0 {
            current = match current {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        let text = match current {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };

        (!text.is_empty()).then_some(text)
    }
}

/// First path that resolves, in priority order.
pub fn first_of(value: &Value, paths: &[FieldPath]) -> Option<String> {
    paths.iter().find_map(|path| path.resolve(value))
}

fn field_or(value: &Value, paths: &[FieldPath], default: &str) -> String {
    first_of(value, paths).unwrap_or_else(|| default.to_string())
}

const JOB_TITLE: &[FieldPath] = &[FieldPath(&["title"])];
const JOB_DESCRIPTION: &[FieldPath] = &[FieldPath(&["description"])];
const JOB_LOCATION: &[FieldPath] = &[
    FieldPath(&["location", "display_name"]),
    FieldPath(&["location"]),
];
const JOB_COMPANY: &[FieldPath] = &[
    FieldPath(&["company", "display_name"]),
    FieldPath(&["company"]),
];
const JOB_URL: &[FieldPath] = &[FieldPath(&["redirect_url"]), FieldPath(&["url"])];

const EVENT_NAME: &[FieldPath] = &[FieldPath(&["name"])];
const EVENT_DESCRIPTION: &[FieldPath] = &[
    FieldPath(&["description"]),
    FieldPath(&["info"]),
    FieldPath(&["pleaseNote"]),
];
const EVENT_VENUE: &[FieldPath] = &[
    FieldPath(&["venue"]),
    FieldPath(&["_embedded", "venues", "0", "name"]),
];
const EVENT_URL: &[FieldPath] = &[FieldPath(&["url"])];
const EVENT_START_OBJECTS: &[FieldPath] = &[FieldPath(&["dates", "start"]), FieldPath(&["start"])];

impl LiveJob {
    /// Normalise a raw job mapping. Returns `None` for non-object values.
    pub fn from_raw(raw: &Value, source: &str) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }

        Some(Self {
            title: field_or(raw, JOB_TITLE, ""),
            description: field_or(raw, JOB_DESCRIPTION, ""),
            location: field_or(raw, JOB_LOCATION, DEFAULT_JOB_LOCATION),
            company: field_or(raw, JOB_COMPANY, DEFAULT_COMPANY),
            url: field_or(raw, JOB_URL, ""),
            source: source.to_string(),
        })
    }
}

impl LiveEvent {
    /// Normalise a raw event mapping. Returns `None` for non-object values.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }

        Some(Self {
            name: field_or(raw, EVENT_NAME, ""),
            description: field_or(raw, EVENT_DESCRIPTION, ""),
            date: event_date(raw).unwrap_or_else(|| DEFAULT_EVENT_DATE.to_string()),
            venue: field_or(raw, EVENT_VENUE, DEFAULT_VENUE),
            url: field_or(raw, EVENT_URL, ""),
        })
    }
}

/// `date` if present as text, else `"{localDate} {localTime}"` from the
/// first start object that has either part.
fn event_date(raw: &Value) -> Option<String> {
    if let Some(date) = FieldPath(&["date"]).resolve(raw) {
        return Some(date);
    }

    EVENT_START_OBJECTS.iter().find_map(|path| {
        let start = path.0.iter().try_fold(raw, |v, seg| v.get(*seg))?;
        let parts: Vec<String> = [FieldPath(&["localDate"]), FieldPath(&["localTime"])]
            .iter()
            .filter_map(|p| p.resolve(start))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    })
}
