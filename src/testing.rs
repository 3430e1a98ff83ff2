//! In-memory `CourseDirectory` used by the unit tests.

use crate::api::CourseDirectory;
use crate::models::{Assignment, Course, Student, UploadReceipt};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListCourses,
    ListStudents(u64),
    ListAssignments(u64),
    Upload {
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_path: PathBuf,
    },
}

#[derive(Default)]
pub struct StubDirectory {
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
    pub assignments: Vec<Assignment>,
    pub fail_upload_with: Option<String>,
    pub fail_listing_with: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl StubDirectory {
    /// One course, one student, one assignment.
    pub fn math_class() -> Self {
        Self {
            courses: vec![course(1, "Math")],
            students: vec![student(10, "Alice")],
            assignments: vec![assignment(100, "HW1")],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn listing_failure(&self) -> Result<()> {
        match &self.fail_listing_with {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CourseDirectory for StubDirectory {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        self.record(Call::ListCourses);
        self.listing_failure()?;
        Ok(self.courses.clone())
    }

    async fn list_students(&self, course_id: u64) -> Result<Vec<Student>> {
        self.record(Call::ListStudents(course_id));
        self.listing_failure()?;
        Ok(self.students.clone())
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>> {
        self.record(Call::ListAssignments(course_id));
        self.listing_failure()?;
        Ok(self.assignments.clone())
    }

    async fn upload_feedback(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_path: &Path,
    ) -> Result<UploadReceipt> {
        self.record(Call::Upload {
            course_id,
            assignment_id,
            user_id,
            file_path: file_path.to_path_buf(),
        });
        if let Some(reason) = &self.fail_upload_with {
            return Err(anyhow!(reason.clone()));
        }
        Ok(UploadReceipt {
            file_id: 555,
            display_name: file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }
}

pub fn course(id: u64, name: &str) -> Course {
    Course {
        id,
        name: name.to_string(),
        access_restricted_by_date: false,
    }
}

pub fn student(id: u64, name: &str) -> Student {
    Student {
        id,
        name: name.to_string(),
    }
}

pub fn assignment(id: u64, name: &str) -> Assignment {
    Assignment {
        id,
        name: name.to_string(),
        due_at: None,
        points_possible: None,
    }
}
