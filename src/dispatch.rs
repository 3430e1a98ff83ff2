use crate::api::CourseDirectory;
use crate::models::{PendingUpload, UploadReceipt};
use crate::selection::{resolve_assignment, resolve_student, SelectionState};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file path is empty")]
    EmptyFilePath,
    #[error("course '{0}' not found")]
    NoCourseSelected(String),
    #[error("student '{0}' not found")]
    StudentNotFound(String),
    #[error("assignment '{0}' not found")]
    AssignmentNotFound(String),
    #[error("remote call failed: {0:#}")]
    RemoteCallFailed(anyhow::Error),
}

/// Resolve the three display names and upload `file_path` once.
///
/// Checks run in a fixed order (path, course, student, assignment) and the
/// upload is only attempted when all of them pass. Nothing is retried.
pub async fn dispatch<D>(
    directory: &D,
    selection: &SelectionState,
    course_name: &str,
    student_name: &str,
    assignment_name: &str,
    file_path: &str,
) -> Result<UploadReceipt, UploadError>
where
    D: CourseDirectory + ?Sized,
{
    if file_path.trim().is_empty() {
        return Err(UploadError::EmptyFilePath);
    }

    let course_id = selection
        .selected_course_id()
        .ok_or_else(|| UploadError::NoCourseSelected(course_name.to_string()))?;

    let student = resolve_student(directory, course_id, student_name)
        .await
        .map_err(UploadError::RemoteCallFailed)?
        .ok_or_else(|| UploadError::StudentNotFound(student_name.to_string()))?;

    let assignment = resolve_assignment(directory, course_id, assignment_name)
        .await
        .map_err(UploadError::RemoteCallFailed)?
        .ok_or_else(|| UploadError::AssignmentNotFound(assignment_name.to_string()))?;

    let pending = PendingUpload {
        course_id,
        assignment_id: assignment.id,
        user_id: student.id,
        file_path: PathBuf::from(file_path),
    };
    tracing::info!(?pending, "uploading feedback");

    directory
        .upload_feedback(
            pending.course_id,
            pending.assignment_id,
            pending.user_id,
            &pending.file_path,
        )
        .await
        .map_err(UploadError::RemoteCallFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{student, Call, StubDirectory};

    async fn math_selection(directory: &StubDirectory) -> SelectionState {
        let mut selection = SelectionState::new();
        selection.refresh_courses(directory).await.unwrap();
        selection.select_course(directory, "Math").await.unwrap();
        selection
    }

    #[tokio::test]
    async fn test_uploads_resolved_ids_exactly_once() {
        let directory = StubDirectory::math_class();
        let selection = math_selection(&directory).await;

        let receipt = dispatch(&directory, &selection, "Math", "Alice", "HW1", "/tmp/f.txt")
            .await
            .unwrap();

        assert_eq!(receipt.file_id, 555);
        assert_eq!(
            directory.upload_calls(),
            vec![Call::Upload {
                course_id: 1,
                assignment_id: 100,
                user_id: 10,
                file_path: PathBuf::from("/tmp/f.txt"),
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_student_skips_upload() {
        let directory = StubDirectory::math_class();
        let selection = math_selection(&directory).await;

        let err = dispatch(&directory, &selection, "Math", "Bob", "HW1", "/tmp/f.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::StudentNotFound(ref name) if name == "Bob"));
        assert!(directory.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_assignment_skips_upload() {
        let directory = StubDirectory::math_class();
        let selection = math_selection(&directory).await;

        let err = dispatch(&directory, &selection, "Math", "Alice", "HW2", "/tmp/f.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::AssignmentNotFound(ref name) if name == "HW2"));
        assert!(directory.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_path_makes_no_remote_calls() {
        let directory = StubDirectory::math_class();
        let selection = SelectionState::new();

        for path in ["", "   ", "\t\n"] {
            let err = dispatch(&directory, &selection, "Math", "Alice", "HW1", path)
                .await
                .unwrap_err();
            assert!(matches!(err, UploadError::EmptyFilePath));
        }
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_course_selected_makes_no_remote_calls() {
        let directory = StubDirectory::math_class();
        let selection = SelectionState::new();

        let err = dispatch(&directory, &selection, "Select a Course", "Alice", "HW1", "/tmp/f.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NoCourseSelected(_)));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_surfaced_not_retried() {
        let directory = StubDirectory {
            fail_upload_with: Some("503 Service Unavailable".to_string()),
            ..StubDirectory::math_class()
        };
        let selection = math_selection(&directory).await;

        let err = dispatch(&directory, &selection, "Math", "Alice", "HW1", "/tmp/f.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::RemoteCallFailed(_)));
        assert!(err.to_string().contains("503"));
        assert_eq!(directory.upload_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_students_resolve_to_first() {
        let directory = StubDirectory {
            students: vec![student(10, "Alice"), student(20, "Alice")],
            ..StubDirectory::math_class()
        };
        let selection = math_selection(&directory).await;

        dispatch(&directory, &selection, "Math", "Alice", "HW1", "/tmp/f.txt")
            .await
            .unwrap();

        assert!(matches!(
            directory.upload_calls().as_slice(),
            [Call::Upload { user_id: 10, .. }]
        ));
    }

    #[tokio::test]
    async fn test_auto_find_placeholder_is_not_a_student() {
        let directory = StubDirectory::math_class();
        let selection = math_selection(&directory).await;

        let err = dispatch(
            &directory,
            &selection,
            "Math",
            "Auto-find Student (Based on File Name)",
            "HW1",
            "/tmp/f.txt",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UploadError::StudentNotFound(_)));
    }
}
