//! Subcommand handlers.
//!
//! Every handler returns a JSON body for stdout plus the process exit code.
//! Store failures that happen before any work starts propagate as errors.

use crate::cli::Command;
use crate::config::CatalogConfig;
use anyhow::{Context, Result};
use catalog_core::{
    lesson_titles_by_slug, CascadeDeleter, CascadeError, ContentImporter, ContentStore,
    ImportError, ImportMode, RetirementJob,
};
use log::info;
use serde_json::{json, Value};

/// Exit code for partial failures that left work to retry.
pub const EXIT_PARTIAL: i32 = 2;
/// Exit code for rejected input or failed operations.
pub const EXIT_FAILED: i32 = 1;

#[derive(Debug)]
pub struct CommandOutput {
    pub body: Value,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(body: Value) -> Self {
        Self { body, exit_code: 0 }
    }

    fn failed(body: Value, exit_code: i32) -> Self {
        Self { body, exit_code }
    }
}

pub fn dispatch<S: ContentStore>(
    command: Command,
    store: S,
    config: &CatalogConfig,
) -> Result<CommandOutput> {
    info!(
        "event=cli_command module=cli status=start command={}",
        command.name()
    );
    match command {
        Command::Retire { dry_run } => retire(store, dry_run),
        Command::Import { file, append } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let mode = if append {
                ImportMode::AppendToSlug
            } else {
                config.import.mode
            };
            Ok(import(store, mode, &json))
        }
        Command::DeleteCourse { course_id } => {
            Ok(match CascadeDeleter::new(store).delete_course(course_id) {
                Ok(report) => CommandOutput::ok(json!({
                    "status": "ok",
                    "course_id": course_id,
                    "report": report,
                })),
                Err(err) => CommandOutput::failed(cascade_error_json(&err), EXIT_PARTIAL),
            })
        }
        Command::Lessons { slug } => {
            let grouped = lesson_titles_by_slug(&store, slug.as_deref())?;
            Ok(CommandOutput::ok(json!(grouped)))
        }
    }
}

fn retire<S: ContentStore>(store: S, dry_run: bool) -> Result<CommandOutput> {
    let job = RetirementJob::new(store);
    if dry_run {
        let candidates = job
            .find_candidates()?
            .into_iter()
            .map(|course| {
                json!({
                    "course_id": course.uuid,
                    "title": course.title,
                    "icon": course.icon,
                    "slug": course.slug,
                })
            })
            .collect::<Vec<_>>();
        return Ok(CommandOutput::ok(json!({
            "dry_run": true,
            "candidates": candidates,
        })));
    }

    let report = job.run()?;
    let body = json!({
        "dry_run": false,
        "scanned": report.scanned,
        "matched": report.matched,
        "deleted_count": report.deleted_count,
        "failed": report
            .failed
            .iter()
            .map(|failure| cascade_error_json(&failure.error))
            .collect::<Vec<_>>(),
    });
    Ok(if report.is_clean() {
        CommandOutput::ok(body)
    } else {
        CommandOutput::failed(body, EXIT_PARTIAL)
    })
}

fn import<S: ContentStore>(store: S, mode: ImportMode, json: &str) -> CommandOutput {
    match ContentImporter::with_mode(store, mode).import_json(json) {
        Ok(outcome) => CommandOutput::ok(json!({
            "status": "ok",
            "mode": mode.as_str(),
            "outcome": outcome,
        })),
        Err(err) => {
            let mut body = json!({
                "status": "error",
                "mode": mode.as_str(),
                "retryable": err.is_retryable(),
                "error": err.to_string(),
            });
            let exit_code = match &err {
                ImportError::Validation(issues) => {
                    body["issues"] = json!(issues);
                    EXIT_FAILED
                }
                ImportError::PartialWrite {
                    course_id,
                    modules_committed,
                    lessons_committed,
                    ..
                } => {
                    body["committed"] = json!({
                        "course_id": course_id,
                        "modules": modules_committed,
                        "lessons": lessons_committed,
                    });
                    EXIT_PARTIAL
                }
                _ => EXIT_FAILED,
            };
            CommandOutput::failed(body, exit_code)
        }
    }
}

fn cascade_error_json(err: &CascadeError) -> Value {
    json!({
        "target": err.target.to_string(),
        "step": err.step.to_string(),
        "completed": err.completed,
        "retryable": err.is_retryable(),
        "error": err.source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{dispatch, import, EXIT_FAILED};
    use crate::cli::Command;
    use crate::config::CatalogConfig;
    use catalog_core::db::open_db_in_memory;
    use catalog_core::{ContentStore, Course, ImportMode, Record, SqliteContentStore};
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "course": { "title": "Rust", "icon": "🦀", "slug": "rust-basics" },
        "modules": [{
            "title": "Ownership",
            "lessons": [
                { "title": "Moves", "type": "theory", "content": "..." },
                { "title": "Borrows", "type": "practice", "content": "..." }
            ]
        }]
    }"#;

    #[test]
    fn import_then_list_lessons() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();

        let output = import(store, ImportMode::InsertNew, DOCUMENT);
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.body["outcome"]["lessons_written"], 2);

        let listed = dispatch(
            Command::Lessons { slug: None },
            store,
            &CatalogConfig::default(),
        )
        .unwrap();
        assert_eq!(
            listed.body["rust-basics"],
            serde_json::json!(["Moves", "Borrows"])
        );
    }

    #[test]
    fn rejected_import_reports_issues() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();

        let output = import(
            store,
            ImportMode::InsertNew,
            r#"{ "course": { "title": "", "icon": "x" }, "modules": [] }"#,
        );
        assert_eq!(output.exit_code, EXIT_FAILED);
        assert_eq!(output.body["status"], "error");
        assert!(!output.body["issues"].as_array().unwrap().is_empty());
        assert!(store.courses().unwrap().is_empty());
    }

    #[test]
    fn import_reads_document_from_file() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let output = dispatch(
            Command::Import {
                file: file.path().to_path_buf(),
                append: false,
            },
            store,
            &CatalogConfig::default(),
        )
        .unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(store.courses().unwrap().len(), 1);
    }

    #[test]
    fn retire_dry_run_lists_without_deleting() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();
        store
            .insert(&Record::from(
                Course::new("Old").with_icon("https://cdn/icon.png"),
            ))
            .unwrap();
        store
            .insert(&Record::from(
                Course::new("Current").with_icon("🦀").with_slug("current"),
            ))
            .unwrap();

        let config = CatalogConfig::default();
        let preview = dispatch(Command::Retire { dry_run: true }, store, &config).unwrap();
        assert_eq!(preview.body["candidates"].as_array().unwrap().len(), 1);
        assert_eq!(store.courses().unwrap().len(), 2);

        let run = dispatch(Command::Retire { dry_run: false }, store, &config).unwrap();
        assert_eq!(run.exit_code, 0);
        assert_eq!(run.body["deleted_count"], 1);
        assert_eq!(store.courses().unwrap().len(), 1);
    }

    #[test]
    fn delete_course_of_unknown_id_is_empty_success() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();
        let output = dispatch(
            Command::DeleteCourse {
                course_id: uuid::Uuid::new_v4(),
            },
            store,
            &CatalogConfig::default(),
        )
        .unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.body["report"]["deleted_course"], false);
    }
}
