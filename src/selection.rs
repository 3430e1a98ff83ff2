use crate::api::CourseDirectory;
use crate::models::{Assignment, CourseRoster, Student};
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// First entry of the course dropdown; never backed by a course.
pub const COURSE_PLACEHOLDER: &str = "Select a Course";

/// Display-name lookups for the current session.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    course_name_to_id: IndexMap<String, Option<u64>>,
    selected_course_id: Option<u64>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the course map from the remote course list.
    ///
    /// The map is replaced wholesale and the current selection is cleared.
    /// When two courses share a name the later one wins.
    pub async fn refresh_courses<D>(&mut self, directory: &D) -> Result<()>
    where
        D: CourseDirectory + ?Sized,
    {
        let courses = directory
            .list_courses()
            .await
            .context("Failed to load courses")?;

        self.course_name_to_id.clear();
        self.course_name_to_id
            .insert(COURSE_PLACEHOLDER.to_string(), None);

        for course in courses {
            if let Some(Some(previous)) = self
                .course_name_to_id
                .insert(course.name.clone(), Some(course.id))
            {
                tracing::warn!(
                    name = %course.name,
                    previous,
                    replacement = course.id,
                    "duplicate course name, keeping the later id"
                );
            }
        }
        self.selected_course_id = None;

        tracing::info!(count = self.course_name_to_id.len() - 1, "courses loaded");
        Ok(())
    }

    /// Dropdown entries in display order, placeholder first.
    pub fn course_names(&self) -> impl Iterator<Item = &str> {
        self.course_name_to_id.keys().map(String::as_str)
    }

    pub fn selected_course_id(&self) -> Option<u64> {
        self.selected_course_id
    }

    /// Point the selection at `name`, without fetching anything.
    ///
    /// Unknown names and the placeholder clear the selection.
    pub fn set_selected_course(&mut self, name: &str) -> Option<u64> {
        self.selected_course_id = self.course_name_to_id.get(name).copied().flatten();
        self.selected_course_id
    }

    /// Select a course and load the students and assignments that depend on it.
    ///
    /// Returns `None` when the name did not resolve to a real course.
    pub async fn select_course<D>(&mut self, directory: &D, name: &str) -> Result<Option<CourseRoster>>
    where
        D: CourseDirectory + ?Sized,
    {
        let Some(course_id) = self.set_selected_course(name) else {
            tracing::debug!(name, "no course behind selection");
            return Ok(None);
        };

        let students = directory
            .list_students(course_id)
            .await
            .with_context(|| format!("Failed to load students for course {}", name))?;
        let assignments = directory
            .list_assignments(course_id)
            .await
            .with_context(|| format!("Failed to load assignments for course {}", name))?;

        tracing::info!(
            course_id,
            students = students.len(),
            assignments = assignments.len(),
            "course selected"
        );

        Ok(Some(CourseRoster {
            students,
            assignments,
        }))
    }
}

/// Fetch the course's students and return the first one named `name`.
pub async fn resolve_student<D>(directory: &D, course_id: u64, name: &str) -> Result<Option<Student>>
where
    D: CourseDirectory + ?Sized,
{
    let students = directory.list_students(course_id).await?;
    warn_on_duplicates("student", name, students.iter().map(|s| s.name.as_str()));
    Ok(students.into_iter().find(|s| s.name == name))
}

/// Fetch the course's assignments and return the first one named `name`.
pub async fn resolve_assignment<D>(
    directory: &D,
    course_id: u64,
    name: &str,
) -> Result<Option<Assignment>>
where
    D: CourseDirectory + ?Sized,
{
    let assignments = directory.list_assignments(course_id).await?;
    warn_on_duplicates("assignment", name, assignments.iter().map(|a| a.name.as_str()));
    Ok(assignments.into_iter().find(|a| a.name == name))
}

fn warn_on_duplicates<'a>(kind: &str, name: &str, names: impl Iterator<Item = &'a str>) {
    let matches = names.filter(|n| *n == name).count();
    if matches > 1 {
        tracing::warn!(kind, name, matches, "ambiguous name, using the first match");
    }
}
