use crate::ui::state::{AppState, FileBrowser, FormField, UploadForm};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

const TITLE: &str = "Canvas Feedback Uploader";

pub fn render_ui(frame: &mut Frame, state: &AppState) {
    match state {
        AppState::LoadingCourses => render_loading(frame, "Loading courses..."),
        AppState::CourseSelection {
            courses,
            selected_index,
            notice,
        } => render_course_selection(frame, courses, *selected_index, notice.as_deref()),
        AppState::LoadingCourseData { course_name } => render_loading(
            frame,
            &format!("Loading students and assignments for {}...", course_name),
        ),
        AppState::UploadForm { form } => render_upload_form(frame, form),
        AppState::Uploading { form } => {
            render_upload_form(frame, form);
            render_loading_popup(frame, &format!("Uploading {}...", form.file_path));
        }
        AppState::FileBrowser { browser, .. } => render_file_browser(frame, browser),
        AppState::Error { message } => render_error(frame, message),
    }
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// First row to draw so that `selected` stays inside a window of `visible` rows.
fn scroll_offset(selected: usize, visible: usize) -> usize {
    selected.saturating_sub(visible.saturating_sub(1))
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

fn render_loading(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let block = Block::default()
        .title(TITLE)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(message)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_loading_popup(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let width = area.width.min(60);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width,
        height: area.height.min(3),
    };

    let paragraph = Paragraph::new(message)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn render_course_selection(
    frame: &mut Frame,
    courses: &[String],
    selected_index: usize,
    notice: Option<&str>,
) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    // Keep the highlighted course on screen
    let visible = usize::from(chunks[0].height.saturating_sub(2)).max(1);
    let offset = scroll_offset(selected_index, visible);

    let items: Vec<ListItem> = courses
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, course)| {
            let prefix = if i == selected_index { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, course)).style(selected_style(i == selected_index))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Course")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, chunks[0]);

    let help_text = match notice {
        Some(notice) => format!("{} | [↑↓: Navigate | Enter: Select | r: Refresh | q: Quit]", notice),
        None => format!(
            "Found: {} course(s) | [↑↓: Navigate | Enter: Select | r: Refresh | q: Quit]",
            courses.len().saturating_sub(1)
        ),
    };
    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[1]);
}

fn render_dropdown(frame: &mut Frame, area: Rect, title: &str, value: &str, position: (usize, usize), focused: bool) {
    let (index, len) = position;
    let text = if len == 0 {
        "(none)".to_string()
    } else {
        format!("▼ {}  ({}/{})", value, index + 1, len)
    };

    let dropdown = Paragraph::new(text)
        .style(selected_style(focused))
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(focus_border(focused)),
        );

    frame.render_widget(dropdown, area);
}

fn render_upload_form(frame: &mut Frame, form: &UploadForm) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(area);

    let course = Paragraph::new(Line::from(vec![
        Span::styled("Course: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(&form.course_name),
    ]))
    .block(
        Block::default()
            .title(TITLE)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(course, chunks[0]);

    let assignment_label = form
        .assignments
        .get(form.assignment_index)
        .map(|a| {
            let due = a
                .due_at
                .map(|d| format!(" (Due: {})", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            let points = a
                .points_possible
                .map(|p| format!(" [{} pts]", p))
                .unwrap_or_default();
            format!("{}{}{}", a.name, due, points)
        })
        .unwrap_or_default();
    render_dropdown(
        frame,
        chunks[1],
        "Assignment",
        &assignment_label,
        (form.assignment_index, form.assignments.len()),
        form.focused_field == FormField::Assignment,
    );

    render_dropdown(
        frame,
        chunks[2],
        "Student",
        form.selected_student_name(),
        (form.student_index, form.students.len()),
        form.focused_field == FormField::Student,
    );

    // Staged files
    let files_focused = form.focused_field == FormField::Files;
    let visible = usize::from(chunks[3].height.saturating_sub(2)).max(1);
    let items: Vec<ListItem> = form
        .staged_files
        .iter()
        .enumerate()
        .skip(scroll_offset(form.file_index, visible))
        .take(visible)
        .map(|(i, file)| {
            let highlighted = files_focused && i == form.file_index;
            let prefix = if highlighted { "> " } else { "  " };
            let mark = if file.marked { "[x] " } else { "[ ] " };
            ListItem::new(format!("{}{}{}", prefix, mark, file.name())).style(selected_style(highlighted))
        })
        .collect();

    let files_title = if form.staged_files.is_empty() {
        "Drop Files Here (drag onto the terminal, or b: Browse)".to_string()
    } else {
        format!("Files ({})", form.staged_files.len())
    };
    let files = List::new(items).block(
        Block::default()
            .title(files_title)
            .borders(Borders::ALL)
            .border_style(focus_border(files_focused)),
    );

    frame.render_widget(files, chunks[3]);

    // File path field
    let path_focused = form.focused_field == FormField::FilePath;
    let cursor = if path_focused { "_" } else { "" };
    let path = Paragraph::new(format!("{}{}", form.file_path, cursor))
        .style(selected_style(path_focused))
        .block(
            Block::default()
                .title("File Path")
                .borders(Borders::ALL)
                .border_style(focus_border(path_focused)),
        );

    frame.render_widget(path, chunks[4]);

    // Status log, newest at the bottom
    let visible = usize::from(chunks[5].height.saturating_sub(2));
    let entries = form.log.entries();
    let status_items: Vec<ListItem> = entries
        .iter()
        .skip(entries.len().saturating_sub(visible))
        .map(|msg| {
            let color = if msg.contains("Error:") { Color::Red } else { Color::Green };
            ListItem::new(format!("• {}", msg)).style(Style::default().fg(color))
        })
        .collect();

    let status_list = List::new(status_items).block(
        Block::default()
            .title("Status Log")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(status_list, chunks[5]);

    let help_text = match form.focused_field {
        FormField::FilePath => "[Tab: Next Field | Enter: Upload | Esc: Back | Ctrl-C: Quit]",
        FormField::Files => {
            "[Tab: Next | ↑↓: Navigate | Space: Mark | Enter: Use Path | Del: Remove | u: Upload | b: Browse | Esc: Back | q: Quit]"
        }
        _ => "[Tab: Next Field | ↑↓: Change | u: Upload | b: Browse | Esc: Back | q: Quit]",
    };
    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[6]);
}

fn render_file_browser(frame: &mut Frame, browser: &FileBrowser) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    // Keep the highlighted entry on screen
    let visible = usize::from(chunks[0].height.saturating_sub(2)).max(1);
    let offset = scroll_offset(browser.selected_index, visible);

    let items: Vec<ListItem> = browser
        .entries
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, entry)| {
            let prefix = if i == browser.selected_index { "> " } else { "  " };
            let suffix = if entry.is_dir { "/" } else { "" };
            let style = if entry.is_dir && i != browser.selected_index {
                Style::default().fg(Color::Blue)
            } else {
                selected_style(i == browser.selected_index)
            };
            ListItem::new(format!("{}{}{}", prefix, entry.name, suffix)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("Open File: {}", browser.dir.display()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, chunks[0]);

    let help = Paragraph::new("[↑↓: Navigate | Enter: Open | Backspace: Up | Esc: Cancel | q: Quit]")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[1]);
}

fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let text = vec![
        Line::from(vec![Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(message),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, chunks[0]);

    let help = Paragraph::new("[Enter: Retry | q: Quit]")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(help, chunks[1]);
}
