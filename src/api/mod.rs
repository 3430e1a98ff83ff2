mod canvas;

pub use canvas::CanvasClient;

use crate::models::{Assignment, Course, Student, UploadReceipt};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// The remote calls the uploader depends on.
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>>;

    async fn list_students(&self, course_id: u64) -> Result<Vec<Student>>;

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>>;

    /// Attach `file_path` as a feedback comment on the user's submission.
    async fn upload_feedback(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_path: &Path,
    ) -> Result<UploadReceipt>;
}
