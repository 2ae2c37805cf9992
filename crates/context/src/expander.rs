//! Lexical query expansion.
//!
//! Turns one free-text query into a small set of variations using a
//! synonym table and a "near me" location heuristic. Each synonym
//! substitution replaces a single word in a fresh copy of the query, so the
//! number of variations grows linearly with the table, never combinatorially.

use std::collections::HashSet;

/// Default synonym table, India-aware. Keys and values are lowercase.
pub const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("tech", &["technology", "software", "it", "engineering"]),
    ("job", &["position", "role", "opportunity"]),
    ("remote", &["work from home", "wfh", "virtual"]),
    ("event", &["conference", "meetup", "workshop"]),
    ("session", &["workshop", "seminar", "webinar"]),
    ("career", &["professional", "employment", "vocation"]),
    ("women", &["female", "gender diversity"]),
    ("mentorship", &["guidance", "coaching", "advising"]),
    // Indian city mappings
    ("delhi", &["new delhi", "delhi ncr"]),
    ("mumbai", &["bombay"]),
    ("bangalore", &["bengaluru"]),
    ("hyderabad", &["cyberabad"]),
    ("chennai", &["madras"]),
    ("pune", &["pimpri", "chinchwad"]),
    ("kolkata", &["calcutta"]),
];

const LOCATION_MARKER: &str = " in ";
const NEAR_ME_SUFFIX: &str = "near me";

/// Expands queries into lowercase variations.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    synonyms: Vec<(String, Vec<String>)>,
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::with_synonyms(DEFAULT_SYNONYMS.iter().map(|(word, syns)| {
            (word.to_string(), syns.iter().map(|s| s.to_string()).collect())
        }))
    }
}

impl QueryExpander {
    /// Create an expander over a custom synonym table.
    ///
    /// Words and synonyms are lowercased on the way in.
    pub fn with_synonyms<I>(table: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let synonyms = table
            .into_iter()
            .map(|(word, syns)| {
                (
                    word.to_lowercase(),
                    syns.into_iter().map(|s| s.to_lowercase()).collect(),
                )
            })
            .collect();

        Self { synonyms }
    }

    fn synonyms_for(&self, word: &str) -> Option<&[String]> {
        self.synonyms
            .iter()
            .find(|(key, _)| key == word)
            .map(|(_, syns)| syns.as_slice())
    }

    /// Expand a query into its variations.
    ///
    /// The lowercased query is always the first entry. Duplicates are
    /// removed keeping first-seen order. A blank query yields no variations.
    pub fn expand(&self, query: &str) -> Vec<String> {
        let lowered = query.trim().to_lowercase();
        if lowered.is_empty() {
            return Vec::new();
        }

        let mut variations = vec![lowered.clone()];
        let words: Vec<&str> = lowered.split_whitespace().collect();

        for (i, word) in words.iter().enumerate() {
            let Some(syns) = self.synonyms_for(word) else {
                continue;
            };
            for syn in syns {
                let mut variation = words.clone();
                variation[i] = syn.as_str();
                variations.push(variation.join(" "));
            }
        }

        if let Some((base, _)) = lowered.split_once(LOCATION_MARKER) {
            let base = base.trim();
            if base.is_empty() {
                variations.push(NEAR_ME_SUFFIX.to_string());
            } else {
                variations.push(format!("{} {}", base, NEAR_ME_SUFFIX));
            }
        }

        let mut seen = HashSet::new();
        variations.retain(|v| seen.insert(v.clone()));

        tracing::debug!("Expanded '{}' into {} variations", query, variations.len());
        variations
    }
}
