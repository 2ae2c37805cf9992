//! Query analysis helpers used before retrieval.
//!
//! Ambiguity detection lets a front end ask a clarifying question instead
//! of retrieving for the wrong sense of a word. Bias detection lets it
//! answer an exclusionary or stereotyping request with a fixed reply.
//! Location extraction fills in a location when the caller did not supply
//! one.

use regex::Regex;
use std::sync::OnceLock;

/// Terms with more than one common meaning, checked in this order.
pub const AMBIGUOUS_TERMS: &[(&str, &[&str])] = &[
    ("bank", &["financial institution", "river bank"]),
    ("python", &["programming language", "snake"]),
    ("java", &["programming language", "island"]),
    ("coach", &["mentor", "vehicle"]),
    ("tablet", &["medicine", "electronic device"]),
];

/// Kind of biased phrasing found in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasType {
    /// Requests that exclude a gender ("women only", "male-dominated")
    GenderExclusionary,
    /// Generalisations about a gender ("men are better at")
    Stereotyping,
}

impl BiasType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasType::GenderExclusionary => "gender_exclusionary",
            BiasType::Stereotyping => "stereotyping",
        }
    }

    /// Reply shown instead of retrieving.
    pub fn response(&self) -> &'static str {
        match self {
            BiasType::GenderExclusionary => {
                "Our platform promotes equal opportunities for all genders. \
                 I can help you find roles matching your skills rather than \
                 focusing on gender-specific positions. What skills or experience \
                 would you like to search for?"
            }
            BiasType::Stereotyping => {
                "I'd like to focus on individual skills and qualifications rather \
                 than generalizations. Could you tell me more about the specific \
                 job requirements or qualifications you're interested in?"
            }
        }
    }
}

/// Phrases per bias type, checked in this order.
pub const BIAS_PATTERNS: &[(BiasType, &[&str])] = &[
    (
        BiasType::GenderExclusionary,
        &[
            "only women",
            "women only",
            "female-only",
            "males only",
            "only men",
            "men only",
            "male-dominated",
            "female-dominated",
        ],
    ),
    (
        BiasType::Stereotyping,
        &[
            "women are better at",
            "men are better at",
            "typical female job",
            "typical male job",
            "women should",
            "men should",
        ],
    ),
];

const LOCATION_PATTERNS: [&str; 4] = [
    r"(?i)\bin\s+([A-Za-z\s]+)(?:,|\.|$)",
    r"(?i)\bat\s+([A-Za-z\s]+)(?:,|\.|$)",
    r"(?i)\bnear\s+([A-Za-z\s]+)(?:,|\.|$)",
    r"(?i)\baround\s+([A-Za-z\s]+)(?:,|\.|$)",
];

/// Return a clarification prompt if the query mentions an ambiguous term.
///
/// Matching is a case-insensitive substring test; the first term of
/// [`AMBIGUOUS_TERMS`] found wins.
pub fn detect_ambiguity(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();

    AMBIGUOUS_TERMS
        .iter()
        .find(|(term, _)| lowered.contains(term))
        .map(|(term, meanings)| {
            format!(
                "I noticed you mentioned '{}'. Did you mean: {}?",
                term,
                meanings.join(", ")
            )
        })
}

/// Check the query for biased phrasing, returning the type and its reply.
///
/// Case-insensitive substring match against [`BIAS_PATTERNS`]; the first
/// type with a matching phrase wins.
pub fn detect_bias(query: &str) -> Option<(BiasType, &'static str)> {
    let lowered = query.to_lowercase();

    BIAS_PATTERNS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lowered.contains(phrase)))
        .map(|(bias, _)| (*bias, bias.response()))
}

fn location_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LOCATION_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Extract a location phrase such as "delhi" from "tech jobs in delhi".
///
/// Patterns are tried in order (`in`, `at`, `near`, `around`); the phrase
/// must run to a comma, a full stop or the end of the message.
pub fn extract_location(message: &str) -> Option<String> {
    location_patterns().iter().find_map(|pattern| {
        pattern
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|location| !location.is_empty())
    })
}
