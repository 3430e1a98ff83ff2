use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// Canvas Directory Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Course {
    pub id: u64,
    // Access-restricted course stubs come back without a name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_restricted_by_date: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
}

// ============================================================================
// Canvas File Upload Models
// ============================================================================

/// Step one of a Canvas file upload: where and how to send the bytes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadTicket {
    pub upload_url: String,
    #[serde(default)]
    pub upload_params: HashMap<String, serde_json::Value>,
    #[serde(default = "default_file_param")]
    pub file_param: String,
}

fn default_file_param() -> String {
    "file".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadedFile {
    pub id: u64,
    #[serde(default)]
    pub display_name: String,
}

// ============================================================================
// Internal Models for Dispatch
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_id: u64,
    pub display_name: String,
}

/// Everything the upload call needs, built right before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub course_id: u64,
    pub assignment_id: u64,
    pub user_id: u64,
    pub file_path: PathBuf,
}

/// Students and assignments fetched for the selected course.
#[derive(Debug, Clone, Default)]
pub struct CourseRoster {
    pub students: Vec<Student>,
    pub assignments: Vec<Assignment>,
}
