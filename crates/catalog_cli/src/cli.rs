//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "catalog",
    version,
    about = "Course catalog content lifecycle tools"
)]
pub struct Cli {
    /// TOML config file. Defaults to `catalog.toml` when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding `database.path`.
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete every legacy course and its content.
    Retire {
        /// List legacy courses without deleting them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Import a course graph from a JSON document.
    Import {
        file: PathBuf,
        /// Append modules to the existing course with the document's slug.
        #[arg(long)]
        append: bool,
    },
    /// Delete one course with its modules, lessons and enrollments.
    DeleteCourse { course_id: Uuid },
    /// List lesson titles grouped by course slug.
    Lessons {
        /// Keep only slugs containing this text.
        #[arg(long)]
        slug: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Retire { .. } => "retire",
            Self::Import { .. } => "import",
            Self::DeleteCourse { .. } => "delete-course",
            Self::Lessons { .. } => "lessons",
        }
    }
}
