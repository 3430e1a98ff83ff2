use crate::files::{display_name, BrowserEntry};
use crate::models::{Assignment, CourseRoster};
use chrono::Local;
use std::path::PathBuf;

/// First entry of the student dropdown. Matching students by file name is not
/// implemented, so this entry never resolves to a student.
pub const AUTO_FIND_PLACEHOLDER: &str = "Auto-find Student (Based on File Name)";

const MAX_LOG_ENTRIES: usize = 20;

#[derive(Debug, Clone)]
pub enum AppState {
    LoadingCourses,
    CourseSelection {
        courses: Vec<String>,
        selected_index: usize,
        notice: Option<String>,
    },
    LoadingCourseData {
        course_name: String,
    },
    UploadForm {
        form: UploadForm,
    },
    Uploading {
        form: UploadForm,
    },
    FileBrowser {
        form: UploadForm,
        browser: FileBrowser,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Assignment,
    Student,
    Files,
    FilePath,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Assignment => FormField::Student,
            FormField::Student => FormField::Files,
            FormField::Files => FormField::FilePath,
            FormField::FilePath => FormField::Assignment,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Assignment => FormField::FilePath,
            FormField::Student => FormField::Assignment,
            FormField::Files => FormField::Student,
            FormField::FilePath => FormField::Files,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub marked: bool,
}

impl StagedFile {
    pub fn name(&self) -> String {
        display_name(&self.path)
    }
}

/// Operator-visible outcome log shown under the form.
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    entries: Vec<String>,
}

impl StatusLog {
    pub fn add(&mut self, message: impl Into<String>) {
        let stamped = format!("[{}] {}", Local::now().format("%H:%M:%S"), message.into());
        self.entries.push(stamped);
        // Keep only the last entries
        if self.entries.len() > MAX_LOG_ENTRIES {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct UploadForm {
    pub course_name: String,
    pub assignments: Vec<Assignment>,
    pub students: Vec<String>,
    pub assignment_index: usize,
    pub student_index: usize,
    pub staged_files: Vec<StagedFile>,
    pub file_index: usize,
    pub file_path: String,
    pub focused_field: FormField,
    pub log: StatusLog,
}

impl UploadForm {
    pub fn new(course_name: String, roster: CourseRoster) -> Self {
        let mut students = Vec::with_capacity(roster.students.len() + 1);
        students.push(AUTO_FIND_PLACEHOLDER.to_string());
        students.extend(roster.students.into_iter().map(|s| s.name));

        let mut log = StatusLog::default();
        log.add(format!(
            "Loaded {} student(s) and {} assignment(s) for {}",
            students.len() - 1,
            roster.assignments.len(),
            course_name
        ));

        Self {
            course_name,
            assignments: roster.assignments,
            students,
            assignment_index: 0,
            student_index: 0,
            staged_files: Vec::new(),
            file_index: 0,
            file_path: String::new(),
            focused_field: FormField::Assignment,
            log,
        }
    }

    pub fn selected_student_name(&self) -> &str {
        self.students
            .get(self.student_index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn selected_assignment_name(&self) -> &str {
        self.assignments
            .get(self.assignment_index)
            .map(|a| a.name.as_str())
            .unwrap_or_default()
    }

    pub fn move_up(&mut self) {
        let index = match self.focused_field {
            FormField::Assignment => &mut self.assignment_index,
            FormField::Student => &mut self.student_index,
            FormField::Files => &mut self.file_index,
            FormField::FilePath => return,
        };
        *index = index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let (index, len) = match self.focused_field {
            FormField::Assignment => (&mut self.assignment_index, self.assignments.len()),
            FormField::Student => (&mut self.student_index, self.students.len()),
            FormField::Files => (&mut self.file_index, self.staged_files.len()),
            FormField::FilePath => return,
        };
        if *index < len.saturating_sub(1) {
            *index += 1;
        }
    }

    /// Stage dropped or browsed files; the last one becomes the upload path.
    pub fn add_files(&mut self, paths: Vec<PathBuf>) {
        let Some(last) = paths.last() else {
            return;
        };
        self.file_path = last.display().to_string();
        self.staged_files
            .extend(paths.into_iter().map(|path| StagedFile { path, marked: false }));
        self.file_index = self.staged_files.len() - 1;
    }

    /// Copy the highlighted staged file into the path field.
    pub fn use_highlighted_file(&mut self) -> Option<String> {
        let file = self.staged_files.get(self.file_index)?;
        self.file_path = file.path.display().to_string();
        Some(file.name())
    }

    pub fn toggle_mark(&mut self) {
        if let Some(file) = self.staged_files.get_mut(self.file_index) {
            file.marked = !file.marked;
        }
    }

    /// Remove marked files, or the highlighted one when nothing is marked.
    pub fn remove_files(&mut self) -> usize {
        let before = self.staged_files.len();
        if self.staged_files.iter().any(|f| f.marked) {
            self.staged_files.retain(|f| !f.marked);
        } else if self.file_index < self.staged_files.len() {
            self.staged_files.remove(self.file_index);
        }
        self.file_index = self.file_index.min(self.staged_files.len().saturating_sub(1));
        before - self.staged_files.len()
    }
}

#[derive(Debug, Clone)]
pub struct FileBrowser {
    pub dir: PathBuf,
    pub entries: Vec<BrowserEntry>,
    pub selected_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assignment, student};

    fn form() -> UploadForm {
        UploadForm::new(
            "Math".to_string(),
            CourseRoster {
                students: vec![student(10, "Alice"), student(11, "Bob")],
                assignments: vec![assignment(100, "HW1")],
            },
        )
    }

    #[test]
    fn test_student_list_starts_with_placeholder() {
        let form = form();
        assert_eq!(form.students, vec![AUTO_FIND_PLACEHOLDER, "Alice", "Bob"]);
        assert_eq!(form.selected_student_name(), AUTO_FIND_PLACEHOLDER);
        assert_eq!(form.selected_assignment_name(), "HW1");
    }

    #[test]
    fn test_navigation_clamps_to_list_bounds() {
        let mut form = form();
        form.focused_field = FormField::Student;
        for _ in 0..5 {
            form.move_down();
        }
        assert_eq!(form.selected_student_name(), "Bob");
        for _ in 0..5 {
            form.move_up();
        }
        assert_eq!(form.student_index, 0);
    }

    #[test]
    fn test_added_files_set_path_to_last() {
        let mut form = form();
        form.add_files(vec![PathBuf::from("/tmp/a.txt"), PathBuf::from("/tmp/b.txt")]);
        assert_eq!(form.file_path, "/tmp/b.txt");
        assert_eq!(form.staged_files.len(), 2);
        assert_eq!(form.file_index, 1);

        form.file_index = 0;
        assert_eq!(form.use_highlighted_file().as_deref(), Some("a.txt"));
        assert_eq!(form.file_path, "/tmp/a.txt");
    }

    #[test]
    fn test_remove_prefers_marked_files() {
        let mut form = form();
        form.add_files(vec![
            PathBuf::from("/tmp/a.txt"),
            PathBuf::from("/tmp/b.txt"),
            PathBuf::from("/tmp/c.txt"),
        ]);
        form.file_index = 0;
        form.toggle_mark();
        form.file_index = 2;
        form.toggle_mark();

        assert_eq!(form.remove_files(), 2);
        assert_eq!(form.staged_files[0].name(), "b.txt");
        assert_eq!(form.file_index, 0);

        assert_eq!(form.remove_files(), 1);
        assert!(form.staged_files.is_empty());
        assert_eq!(form.remove_files(), 0);
    }

    #[test]
    fn test_status_log_keeps_latest_entries() {
        let mut log = StatusLog::default();
        for i in 0..25 {
            log.add(format!("entry {}", i));
        }
        assert_eq!(log.entries().len(), MAX_LOG_ENTRIES);
        assert!(log.entries()[0].ends_with("entry 5"));
    }
}
