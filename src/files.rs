use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Turn text a terminal pasted for a file drop into the regular files it names.
///
/// Terminals differ in how they deliver drops: one path per line, several
/// shell-quoted paths on one line, or `file://` URLs. Anything that does not
/// point at an existing regular file is dropped.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // An unquoted path containing spaces
        if let Some(path) = to_local_path(line).filter(|p| p.is_file()) {
            paths.push(path);
            continue;
        }

        paths.extend(
            split_shell_words(line)
                .iter()
                .filter_map(|word| to_local_path(word))
                .filter(|p| p.is_file()),
        );
    }

    paths
}

fn to_local_path(word: &str) -> Option<PathBuf> {
    if word.starts_with("file://") {
        return url::Url::parse(word).ok()?.to_file_path().ok();
    }
    Some(PathBuf::from(word))
}

/// Split on whitespace, honouring single quotes, double quotes and backslash escapes.
fn split_shell_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }

    words
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List `dir` for the file browser: parent link, then directories, then files.
pub fn read_dir_entries(dir: &Path) -> Result<Vec<BrowserEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            dirs.push(BrowserEntry {
                name,
                path,
                is_dir: true,
            });
        } else {
            files.push(BrowserEntry {
                name,
                path,
                is_dir: false,
            });
        }
    }

    dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if let Some(parent) = dir.parent() {
        entries.push(BrowserEntry {
            name: "..".to_string(),
            path: parent.to_path_buf(),
            is_dir: true,
        });
    }
    entries.extend(dirs);
    entries.extend(files);

    Ok(entries)
}

/// File name shown in the staged-file list.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"feedback").unwrap();
        path
    }

    #[test]
    fn test_drop_keeps_only_existing_files() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.txt");
        let missing = dir.path().join("missing.txt");

        let text = format!("{}\n{}\n{}\n", a.display(), missing.display(), dir.path().display());
        assert_eq!(parse_dropped_paths(&text), vec![a]);
    }

    #[test]
    fn test_drop_accepts_quoted_and_escaped_paths() {
        let dir = TempDir::new().unwrap();
        let spaced = touch(&dir, "my notes.pdf");
        let other = touch(&dir, "b.txt");

        let escaped = spaced.display().to_string().replace(' ', "\\ ");
        let text = format!("{} '{}'", escaped, other.display());
        assert_eq!(parse_dropped_paths(&text), vec![spaced, other]);
    }

    #[test]
    fn test_drop_accepts_unquoted_path_with_spaces() {
        let dir = TempDir::new().unwrap();
        let spaced = touch(&dir, "week 3 feedback.docx");

        assert_eq!(parse_dropped_paths(&spaced.display().to_string()), vec![spaced]);
    }

    #[test]
    fn test_drop_accepts_file_urls() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.txt");
        let uri = url::Url::from_file_path(&a).unwrap();

        assert_eq!(parse_dropped_paths(uri.as_str()), vec![a]);
    }

    #[test]
    fn test_split_shell_words() {
        assert_eq!(
            split_shell_words(r#"one "two three" four\ five"#),
            vec!["one", "two three", "four five"]
        );
        assert!(split_shell_words("   ").is_empty());
    }

    #[test]
    fn test_dir_entries_sorted_dirs_first() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "b.txt");
        touch(&dir, "A.txt");
        fs::create_dir(dir.path().join("zeta")).unwrap();

        let entries = read_dir_entries(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["..", "zeta", "A.txt", "b.txt"]);
        assert!(entries[1].is_dir);
        assert!(!entries[2].is_dir);
    }

    #[test]
    fn test_display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/feedback/alice.pdf")), "alice.pdf");
    }
}
