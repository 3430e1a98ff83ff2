use crate::api::CourseDirectory;
use crate::models::{Assignment, Course, Student, UploadReceipt, UploadTicket, UploadedFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LOCATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::path::Path;

const PER_PAGE: u32 = 100;

#[derive(Clone)]
pub struct CanvasClient {
    client: reqwest::Client,
    // File storage answers uploads with a redirect that must be confirmed by hand
    upload_client: reqwest::Client,
    api_base: String,
    token: String,
}

impl CanvasClient {
    pub fn new(api_base: String, token: String) -> Result<Self> {
        Self::with_builder(api_base, token, reqwest::Client::builder)
    }

    fn with_builder(
        api_base: String,
        token: String,
        builder: fn() -> reqwest::ClientBuilder,
    ) -> Result<Self> {
        let client = builder()
            .timeout(std::time::Duration::from_secs(120)) // 2 minute timeout
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        let upload_client = builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build upload HTTP client")?;
        Ok(Self {
            client,
            upload_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .context("Access token contains characters not allowed in a header")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("canvas-feedback-uploader"),
        );
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .send()
            .await
            .context(format!("Failed to send request to {}", url))?;

        read_json(response, &url).await
    }

    /// Fetch every page of a list endpoint, stopping at the first empty page.
    async fn get_paged<T: DeserializeOwned>(&self, path: &str, max_pages: u32) -> Result<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let paged_path = format!("{}{}page={}&per_page={}", path, separator, page, PER_PAGE);
            let items: Vec<T> = self.get(&paged_path).await?;

            if items.is_empty() {
                break;
            }

            all_items.extend(items);
            page += 1;

            if page > max_pages {
                // Only warn when the limit actually left results behind
                let next_path = format!("{}{}page={}&per_page={}", path, separator, page, PER_PAGE);
                let next: Vec<serde_json::Value> = self.get(&next_path).await?;
                if !next.is_empty() {
                    tracing::warn!(path, max_pages, "page limit reached, later pages were not fetched");
                }
                break;
            }
        }

        Ok(all_items)
    }

    /// Step 1: ask Canvas where to send the comment attachment.
    async fn request_upload_ticket(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_name: &str,
        size: u64,
    ) -> Result<UploadTicket> {
        let url = self.url(&format!(
            "/courses/{}/assignments/{}/submissions/{}/comments/files",
            course_id, assignment_id, user_id
        ));
        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .form(&[("name", file_name.to_string()), ("size", size.to_string())])
            .send()
            .await
            .context(format!("Failed to send request to {}", url))?;

        read_json(response, &url).await
    }

    /// Step 2: send the bytes to the storage endpoint named by the ticket.
    async fn send_file(&self, ticket: &UploadTicket, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        let mut form = Form::new();
        // The file part has to come after every upload param
        for (key, value) in &ticket.upload_params {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), value);
        }
        form = form.part(
            ticket.file_param.clone(),
            Part::bytes(bytes).file_name(file_name.to_string()),
        );

        let response = self
            .upload_client
            .post(&ticket.upload_url)
            .multipart(form)
            .send()
            .await
            .context(format!("Failed to send file to {}", ticket.upload_url))?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .context("Upload redirect is missing a Location header")?
                .to_string();
            tracing::debug!(%location, "confirming upload");

            let confirm = self
                .client
                .get(&location)
                .headers(self.build_headers()?)
                .send()
                .await
                .context(format!("Failed to confirm upload at {}", location))?;
            return read_json(confirm, &location).await;
        }

        read_json(response, &ticket.upload_url).await
    }

    /// Step 3: attach the uploaded file to the submission as a comment.
    async fn attach_comment_file(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_id: u64,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/courses/{}/assignments/{}/submissions/{}",
            course_id, assignment_id, user_id
        ));
        let response = self
            .client
            .put(&url)
            .headers(self.build_headers()?)
            .form(&[("comment[file_ids][]", file_id.to_string())])
            .send()
            .await
            .context(format!("Failed to send request to {}", url))?;

        let _submission: serde_json::Value = read_json(response, &url).await?;
        Ok(())
    }
}

#[async_trait]
impl CourseDirectory for CanvasClient {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let courses: Vec<Course> = self.get_paged("/courses", 10).await?;
        Ok(courses
            .into_iter()
            .filter(|c| !c.access_restricted_by_date && !c.name.is_empty())
            .collect())
    }

    async fn list_students(&self, course_id: u64) -> Result<Vec<Student>> {
        let path = format!("/courses/{}/users?enrollment_type[]=student", course_id);
        self.get_paged(&path, 100).await
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>> {
        let path = format!("/courses/{}/assignments", course_id);
        self.get_paged(&path, 100).await
    }

    async fn upload_feedback(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        file_path: &Path,
    ) -> Result<UploadReceipt> {
        let bytes = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", file_path.display()))?;

        let ticket = self
            .request_upload_ticket(course_id, assignment_id, user_id, &file_name, bytes.len() as u64)
            .await
            .context("Failed to start feedback upload")?;
        let uploaded = self
            .send_file(&ticket, &file_name, bytes)
            .await
            .context("Failed to upload feedback file")?;
        self.attach_comment_file(course_id, assignment_id, user_id, uploaded.id)
            .await
            .context("Failed to attach feedback file to submission")?;

        tracing::info!(
            course_id,
            assignment_id,
            user_id,
            file_id = uploaded.id,
            "feedback file attached"
        );

        let display_name = if uploaded.display_name.is_empty() {
            file_name
        } else {
            uploaded.display_name
        };
        Ok(UploadReceipt {
            file_id: uploaded.id,
            display_name,
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let status = response.status();

    // Get the response text for both error and success cases
    let response_text = response.text().await.context("Failed to get response text")?;

    if !status.is_success() {
        anyhow::bail!(
            "API request failed with status {} for URL {}\nResponse body: {}",
            status,
            url,
            truncate(&response_text, 500)
        );
    }

    serde_json::from_str(&response_text).with_context(|| {
        format!(
            "Failed to parse JSON response from {}. Response body (first 500 chars): {}",
            url,
            truncate(&response_text, 500)
        )
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
