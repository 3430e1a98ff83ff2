use crate::api::CourseDirectory;
use crate::dispatch::{dispatch, UploadError};
use crate::files::{parse_dropped_paths, read_dir_entries};
use crate::selection::SelectionState;
use crate::ui::render::render_ui;
use crate::ui::state::{AppState, FileBrowser, FormField, UploadForm};
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};

/// Remote work queued by a key press, run after the next redraw.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    LoadCourses,
    OpenCourse { name: String },
    Upload,
}

pub struct App<D> {
    directory: D,
    selection: SelectionState,
    state: AppState,
    pending: Option<Action>,
}

impl<D: CourseDirectory> App<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            selection: SelectionState::new(),
            state: AppState::LoadingCourses,
            pending: Some(Action::LoadCourses),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main event loop
        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            // Always redraw the UI
            terminal.draw(|f| render_ui(f, &self.state))?;

            // Run queued remote work once its loading screen is visible
            if self.pending.is_some() {
                self.perform_pending().await;
                continue;
            }

            if event::poll(std::time::Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key_event(key)? {
                            break; // User quit
                        }
                    }
                    // Terminals deliver dropped files as pasted text
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }

            // Small yield to allow other async tasks to run
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        Ok(())
    }

    async fn perform_pending(&mut self) {
        match self.pending.take() {
            Some(Action::LoadCourses) => self.load_courses().await,
            Some(Action::OpenCourse { name }) => self.open_course(name).await,
            Some(Action::Upload) => {
                let current_state = std::mem::replace(&mut self.state, AppState::LoadingCourses);
                match current_state {
                    AppState::Uploading { form } => self.upload(form).await,
                    other => self.state = other,
                }
            }
            None => {}
        }
    }

    async fn load_courses(&mut self) {
        self.state = AppState::LoadingCourses;
        match self.selection.refresh_courses(&self.directory).await {
            Ok(()) => {
                let courses: Vec<String> = self.selection.course_names().map(String::from).collect();
                let notice = if courses.len() <= 1 {
                    Some("No courses found. Please check your access token permissions.".to_string())
                } else {
                    None
                };
                self.state = AppState::CourseSelection {
                    courses,
                    selected_index: 0,
                    notice,
                };
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                self.state = AppState::Error {
                    message: format!("{:#}", e),
                };
            }
        }
    }

    async fn open_course(&mut self, name: String) {
        match self.selection.select_course(&self.directory, &name).await {
            Ok(Some(roster)) => {
                self.state = AppState::UploadForm {
                    form: UploadForm::new(name, roster),
                };
            }
            Ok(None) => {
                self.state = self.course_selection(Some("Select a course to continue.".to_string()));
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                self.state = AppState::Error {
                    message: format!("{:#}", e),
                };
            }
        }
    }

    async fn upload(&mut self, mut form: UploadForm) {
        let result = dispatch(
            &self.directory,
            &self.selection,
            &form.course_name,
            form.selected_student_name(),
            form.selected_assignment_name(),
            &form.file_path,
        )
        .await;

        match result {
            Ok(receipt) => {
                let message = format!(
                    "Uploaded {} for {} on {} (file id {})",
                    receipt.display_name,
                    form.selected_student_name(),
                    form.selected_assignment_name(),
                    receipt.file_id
                );
                tracing::info!("{}", message);
                form.log.add(message);
            }
            Err(e) => {
                match &e {
                    UploadError::RemoteCallFailed(_) => tracing::error!("Upload failed: {}", e),
                    _ => tracing::warn!("Upload rejected: {}", e),
                }
                form.log.add(format!("Error: {}", e));
            }
        }

        self.state = AppState::UploadForm { form };
    }

    /// Rebuild the course list from the current selection without refetching.
    fn course_selection(&self, notice: Option<String>) -> AppState {
        let courses: Vec<String> = self.selection.course_names().map(String::from).collect();
        AppState::CourseSelection {
            courses,
            selected_index: 0,
            notice,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        // Take ownership of the state to avoid borrowing issues
        let current_state = std::mem::replace(&mut self.state, AppState::LoadingCourses);

        match current_state {
            AppState::CourseSelection {
                courses,
                mut selected_index,
                notice,
            } => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('r') => {
                    self.pending = Some(Action::LoadCourses);
                }
                KeyCode::Up => {
                    selected_index = selected_index.saturating_sub(1);
                    self.state = AppState::CourseSelection {
                        courses,
                        selected_index,
                        notice,
                    };
                }
                KeyCode::Down => {
                    if selected_index < courses.len().saturating_sub(1) {
                        selected_index += 1;
                    }
                    self.state = AppState::CourseSelection {
                        courses,
                        selected_index,
                        notice,
                    };
                }
                KeyCode::Enter => match courses.get(selected_index) {
                    Some(name) => {
                        self.state = AppState::LoadingCourseData {
                            course_name: name.clone(),
                        };
                        self.pending = Some(Action::OpenCourse { name: name.clone() });
                    }
                    None => {
                        self.state = AppState::CourseSelection {
                            courses,
                            selected_index,
                            notice,
                        };
                    }
                },
                _ => {
                    self.state = AppState::CourseSelection {
                        courses,
                        selected_index,
                        notice,
                    };
                }
            },
            AppState::UploadForm { form } => return self.handle_form_key(form, key),
            AppState::FileBrowser { form, browser } => return self.handle_browser_key(form, browser, key),
            AppState::Error { message } => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Enter => {
                    self.pending = Some(Action::LoadCourses);
                }
                _ => {
                    self.state = AppState::Error { message };
                }
            },
            // Loading screens ignore input until their work finishes
            other => self.state = other,
        }

        Ok(false)
    }

    fn handle_form_key(&mut self, mut form: UploadForm, key: KeyEvent) -> Result<bool> {
        match (form.focused_field, key.code) {
            (_, KeyCode::Esc) => {
                let selected_index = self
                    .selection
                    .course_names()
                    .position(|name| name == form.course_name)
                    .unwrap_or(0);
                self.state = self.course_selection(None);
                if let AppState::CourseSelection { selected_index: index, .. } = &mut self.state {
                    *index = selected_index;
                }
                return Ok(false);
            }
            (_, KeyCode::Tab) => form.focused_field = form.focused_field.next(),
            (_, KeyCode::BackTab) => form.focused_field = form.focused_field.previous(),
            (_, KeyCode::Up) => form.move_up(),
            (_, KeyCode::Down) => form.move_down(),
            (FormField::FilePath, KeyCode::Enter) => {
                self.state = AppState::Uploading { form };
                self.pending = Some(Action::Upload);
                return Ok(false);
            }
            (FormField::FilePath, KeyCode::Backspace) => {
                form.file_path.pop();
            }
            (FormField::FilePath, KeyCode::Char(c)) => form.file_path.push(c),
            (_, KeyCode::Char('q')) => return Ok(true),
            (_, KeyCode::Char('u')) => {
                self.state = AppState::Uploading { form };
                self.pending = Some(Action::Upload);
                return Ok(false);
            }
            (_, KeyCode::Char('b')) => {
                let start = browse_start_dir(&form.file_path);
                match read_dir_entries(&start) {
                    Ok(entries) => {
                        self.state = AppState::FileBrowser {
                            form,
                            browser: FileBrowser {
                                dir: start,
                                entries,
                                selected_index: 0,
                            },
                        };
                        return Ok(false);
                    }
                    Err(e) => {
                        tracing::warn!("{:#}", e);
                        form.log.add(format!("Error: {:#}", e));
                    }
                }
            }
            (FormField::Files, KeyCode::Char(' ')) => form.toggle_mark(),
            (FormField::Files, KeyCode::Enter) => {
                if let Some(name) = form.use_highlighted_file() {
                    form.log.add(format!("Upload path set to {}", name));
                }
            }
            (FormField::Files, KeyCode::Delete | KeyCode::Backspace) => {
                let removed = form.remove_files();
                if removed > 0 {
                    form.log.add(format!("Removed {} file(s) from the list", removed));
                }
            }
            _ => {}
        }

        self.state = AppState::UploadForm { form };
        Ok(false)
    }

    fn handle_browser_key(
        &mut self,
        mut form: UploadForm,
        mut browser: FileBrowser,
        key: KeyEvent,
    ) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                self.state = AppState::UploadForm { form };
                return Ok(false);
            }
            KeyCode::Up => browser.selected_index = browser.selected_index.saturating_sub(1),
            KeyCode::Down => {
                if browser.selected_index < browser.entries.len().saturating_sub(1) {
                    browser.selected_index += 1;
                }
            }
            KeyCode::Backspace | KeyCode::Left => {
                if let Some(parent) = browser.dir.parent().map(Path::to_path_buf) {
                    change_dir(&mut browser, parent, &mut form);
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = browser.entries.get(browser.selected_index).cloned() {
                    if entry.is_dir {
                        change_dir(&mut browser, entry.path, &mut form);
                    } else {
                        form.add_files(vec![entry.path]);
                        form.log.add(format!("Added {}", entry.name));
                        self.state = AppState::UploadForm { form };
                        return Ok(false);
                    }
                }
            }
            _ => {}
        }

        self.state = AppState::FileBrowser { form, browser };
        Ok(false)
    }

    fn handle_paste(&mut self, text: &str) {
        let current_state = std::mem::replace(&mut self.state, AppState::LoadingCourses);
        self.state = match current_state {
            AppState::UploadForm { mut form } => {
                let paths = parse_dropped_paths(text);
                if !paths.is_empty() {
                    form.log.add(format!("Added {} file(s)", paths.len()));
                    form.add_files(paths);
                } else if form.focused_field == FormField::FilePath {
                    form.file_path.push_str(text.lines().next().unwrap_or_default().trim());
                } else {
                    form.log.add("Drop ignored: no readable files");
                }
                AppState::UploadForm { form }
            }
            other => other,
        };
    }

    #[cfg(test)]
    fn state(&self) -> &AppState {
        &self.state
    }
}

fn browse_start_dir(file_path: &str) -> PathBuf {
    Path::new(file_path.trim())
        .parent()
        .filter(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn change_dir(browser: &mut FileBrowser, dir: PathBuf, form: &mut UploadForm) {
    match read_dir_entries(&dir) {
        Ok(entries) => {
            browser.dir = dir;
            browser.entries = entries;
            browser.selected_index = 0;
        }
        Err(e) => {
            tracing::warn!("{:#}", e);
            form.log.add(format!("Error: {:#}", e));
        }
    }
}
