//! Loading of the two local corpora.
//!
//! Both loaders return errors rather than empty collections; the context
//! service decides to degrade a failed corpus to "empty".

use crate::records::{first_of, FieldPath, JobRecord, SessionRecord};
use asha_core::{AppError, AppResult};
use serde_json::Value;
use std::path::Path;

/// Accepted CSV header spellings per job field, compared case-insensitively.
const JOB_COLUMNS: [(&str, &[&str]); 4] = [
    ("title", &["title", "job_title", "job title"]),
    ("description", &["description", "job_description", "job description"]),
    ("location", &["location", "city"]),
    ("company", &["company", "company_name", "company name"]),
];

const SESSION_TITLE: &[FieldPath] = &[FieldPath(&["title"]), FieldPath(&["Title"])];
const SESSION_DESCRIPTION: &[FieldPath] =
    &[FieldPath(&["description"]), FieldPath(&["Description"])];
const SESSION_DATE: &[FieldPath] = &[FieldPath(&["date"]), FieldPath(&["Date"])];

/// Load the jobs CSV.
///
/// Missing columns and empty cells become empty strings; a file without a
/// recognisable `title` or `description` column is rejected.
pub fn load_jobs(path: &Path) -> AppResult<Vec<JobRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::Dataset(format!("Failed to open jobs dataset {:?}: {}", path, e)))?;

    let headers = reader.headers()?.clone();
    let column = |field: &str| -> Option<usize> {
        let aliases = JOB_COLUMNS.iter().find(|(name, _)| *name == field)?.1;
        headers
            .iter()
            .position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
    };

    let (title, description, location, company) = (
        column("title"),
        column("description"),
        column("location"),
        column("company"),
    );

    if title.is_none() && description.is_none() {
        return Err(AppError::Dataset(format!(
            "Jobs dataset {:?} has neither a title nor a description column",
            path
        )));
    }

    let mut jobs = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            AppError::Dataset(format!("Failed to read jobs row {}: {}", line + 2, e))
        })?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .unwrap_or_default()
                .to_string()
        };

        jobs.push(JobRecord {
            title: cell(title),
            description: cell(description),
            location: cell(location),
            company: cell(company),
        });
    }

    tracing::info!("Loaded {} job records from {:?}", jobs.len(), path);
    Ok(jobs)
}

/// Load the sessions JSON (an array of objects). Non-object entries are
/// skipped.
pub fn load_sessions(path: &Path) -> AppResult<Vec<SessionRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Dataset(format!("Failed to read sessions dataset {:?}: {}", path, e))
    })?;

    let parsed: Value = serde_json::from_str(&content)?;
    let entries = parsed.as_array().ok_or_else(|| {
        AppError::Dataset(format!("Sessions dataset {:?} is not a JSON array", path))
    })?;

    let sessions: Vec<SessionRecord> = entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| SessionRecord {
            title: first_of(entry, SESSION_TITLE).unwrap_or_default(),
            description: first_of(entry, SESSION_DESCRIPTION).unwrap_or_default(),
            date: first_of(entry, SESSION_DATE).unwrap_or_default(),
        })
        .collect();

    if sessions.len() < entries.len() {
        tracing::warn!(
            "Skipped {} non-object session entries in {:?}",
            entries.len() - sessions.len(),
            path
        );
    }

    tracing::info!("Loaded {} session records from {:?}", sessions.len(), path);
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_jobs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.csv");
        std::fs::write(
            &path,
            "Title,Description,Location,Company\n\
             Data Analyst,\"SQL, dashboards and reporting\",Pune,Acme\n\
             Backend Engineer,Rust services,,\n",
        )
        .unwrap();

        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Data Analyst");
        assert_eq!(jobs[0].description, "SQL, dashboards and reporting");
        assert_eq!(jobs[1].location, "");
        assert_eq!(jobs[1].company, "");
    }

    #[test]
    fn test_load_jobs_missing_columns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.csv");
        std::fs::write(&path, "title,description\nLibrarian,City library\n").unwrap();

        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs[0].title, "Librarian");
        assert_eq!(jobs[0].location, "");
    }

    #[test]
    fn test_load_jobs_rejects_unrelated_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        assert!(matches!(load_jobs(&path), Err(AppError::Dataset(_))));
    }

    #[test]
    fn test_load_jobs_missing_file() {
        let result = load_jobs(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(AppError::Dataset(_))));
    }

    #[test]
    fn test_load_sessions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "Resume Clinic", "description": "Bring your CV", "date": "2026-11-05"},
                {"Title": "Negotiation 101", "description": null},
                "stray string"
            ]"#,
        )
        .unwrap();

        let sessions = load_sessions(&path).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, "2026-11-05");
        assert_eq!(sessions[1].title, "Negotiation 101");
        assert_eq!(sessions[1].description, "");
    }

    #[test]
    fn test_load_sessions_not_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        std::fs::write(&path, r#"{"title": "x"}"#).unwrap();

        assert!(matches!(load_sessions(&path), Err(AppError::Dataset(_))));
    }
}
