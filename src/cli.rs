use crate::api::CourseDirectory;
use crate::dispatch::dispatch;
use crate::selection::SelectionState;
use anyhow::{Context, Result};
use clap::Parser;

/// Attach a grading feedback file to a Canvas submission.
///
/// With no arguments the interactive terminal UI starts. Passing `--file`
/// performs a single upload and exits.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Course name as shown in Canvas
    #[arg(long, requires_all = ["student", "assignment", "file"])]
    pub course: Option<String>,

    /// Student display name
    #[arg(long)]
    pub student: Option<String>,

    /// Assignment name
    #[arg(long)]
    pub assignment: Option<String>,

    /// Feedback file to upload
    #[arg(long, requires_all = ["course", "student", "assignment"])]
    pub file: Option<String>,
}

impl Args {
    pub fn is_headless(&self) -> bool {
        self.file.is_some()
    }
}

pub async fn run_headless<D>(directory: &D, args: Args) -> Result<()>
where
    D: CourseDirectory + ?Sized,
{
    let course = args.course.unwrap_or_default();
    let student = args.student.unwrap_or_default();
    let assignment = args.assignment.unwrap_or_default();
    let file = args.file.unwrap_or_default();

    let mut selection = SelectionState::new();
    selection.refresh_courses(directory).await?;
    selection
        .select_course(directory, &course)
        .await
        .context("Failed to load course")?;

    let receipt = dispatch(directory, &selection, &course, &student, &assignment, &file)
        .await
        .map_err(|e| {
            tracing::error!("Upload failed: {}", e);
            anyhow::Error::new(e)
        })?;

    println!(
        "Uploaded {} for {} on {} (file id {})",
        receipt.display_name, student, assignment, receipt.file_id
    );
    Ok(())
}
