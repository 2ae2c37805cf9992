//! Deduplication, truncation and section rendering.
//!
//! This is the only place records become display text. Sections always
//! come out in the same order: local jobs, live jobs, live events,
//! sessions. Empty sections are left out.

use crate::aggregator::AggregatedResults;
use crate::records::{JobRecord, LiveEvent, LiveJob, SessionRecord};
use std::collections::HashSet;

pub const LOCAL_JOBS_TITLE: &str = "🌟 Local Job Opportunities";
pub const LIVE_JOBS_TITLE: &str = "🚀 Live Job Listings";
pub const EVENTS_TITLE: &str = "📅 Upcoming Events";
pub const SESSIONS_TITLE: &str = "🎓 Local Sessions";

/// Items shown per section, applied after deduplication.
pub const MAX_LOCAL_JOBS: usize = 3;
pub const MAX_LIVE_JOBS_SHOWN: usize = 3;
pub const MAX_EVENTS_SHOWN: usize = 2;
pub const MAX_SESSIONS_SHOWN: usize = 2;

/// Character limits for rendered descriptions.
pub const JOB_DESCRIPTION_LIMIT: usize = 100;
pub const EVENT_DESCRIPTION_LIMIT: usize = 150;

const ELLIPSIS: &str = "...";

/// Keep the first item for each key, in input order. Items whose key is
/// blank are dropped.
pub fn dedupe_by<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let k = key(item).trim();
            !k.is_empty() && seen.insert(k.to_string())
        })
        .collect()
}

/// Shorten `text` to at most `max` characters without splitting a word.
///
/// Text within the limit comes back trimmed. Longer text keeps whole words
/// from the first `max - 3` characters and ends in `...`; if not even one
/// word fits the result is just `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }

    let keep = max.saturating_sub(ELLIPSIS.len());
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (head, rest) = text.split_at(end);

    let at_boundary = rest.chars().next().is_some_and(char::is_whitespace);
    let cut = if at_boundary {
        head
    } else {
        head.rfind(char::is_whitespace)
            .map(|i| &head[..i])
            .unwrap_or("")
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// `### {title}` followed by one item per line, or `None` with no items.
pub fn format_section(title: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(format!("### {}\n{}", title, items.join("\n")))
}

pub fn render_local_job(job: &JobRecord) -> String {
    format!(
        "• **{}** ({})\n  {}\n  {}",
        job.title,
        job.location,
        job.company,
        truncate_text(&job.description, JOB_DESCRIPTION_LIMIT)
    )
}

pub fn render_live_job(job: &LiveJob) -> String {
    format!(
        "• **{}** at {} ({})\n  {}\n  [Apply Here]({})",
        job.title,
        job.company,
        job.location,
        truncate_text(&job.description, JOB_DESCRIPTION_LIMIT),
        job.url
    )
}

pub fn render_event(event: &LiveEvent) -> String {
    format!(
        "• **{}**\n  {} ({})\n  {}\n  [More Info]({})",
        event.name,
        event.venue,
        event.date,
        truncate_text(&event.description, EVENT_DESCRIPTION_LIMIT),
        event.url
    )
}

pub fn render_session(session: &SessionRecord) -> String {
    format!(
        "• **{}**\n  {}\n  {}",
        session.title, session.date, session.description
    )
}

fn capped<T>(items: Vec<T>, cap: usize) -> Vec<T> {
    items.into_iter().take(cap).collect()
}

/// Dedupe, cap and render every non-empty section, in display order.
///
/// Live jobs and events are deduplicated and capped first; entries without
/// a link are then left out of the rendered section.
pub fn build_sections(results: AggregatedResults) -> Vec<String> {
    let local_jobs = capped(dedupe_by(results.local_jobs, |j| j.title.as_str()), MAX_LOCAL_JOBS);
    let live_jobs = capped(dedupe_by(results.live_jobs, |j| j.title.as_str()), MAX_LIVE_JOBS_SHOWN);
    let events = capped(dedupe_by(results.live_events, |e| e.name.as_str()), MAX_EVENTS_SHOWN);
    let sessions = capped(dedupe_by(results.sessions, |s| s.title.as_str()), MAX_SESSIONS_SHOWN);

    let sections = [
        (
            LOCAL_JOBS_TITLE,
            local_jobs.iter().map(render_local_job).collect::<Vec<_>>(),
        ),
        (
            LIVE_JOBS_TITLE,
            live_jobs
                .iter()
                .filter(|j| !j.url.trim().is_empty())
                .map(render_live_job)
                .collect(),
        ),
        (
            EVENTS_TITLE,
            events
                .iter()
                .filter(|e| !e.url.trim().is_empty())
                .map(render_event)
                .collect(),
        ),
        (
            SESSIONS_TITLE,
            sessions.iter().map(render_session).collect(),
        ),
    ];

    sections
        .iter()
        .filter_map(|(title, items)| format_section(title, items))
        .collect()
}
