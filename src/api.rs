use std::{path::Path, time::Duration};

use reqwest::{multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{Error, Result};

use self::models::{
    CourseAddRequest, CourseListResponse, ErrorBody, TimetableResponse, VacancyResponse,
    VersionResponse,
};

pub mod models;

/// Client of the scheduling service
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        // Use custom User-Agent
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Full URL of an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Upload a CSV of courses and let the service build a new timetable
    #[instrument(skip(self))]
    pub async fn build_schedule(&self, csv: &Path) -> Result<TimetableResponse> {
        let bytes = tokio::fs::read(csv).await?;
        let file_name = csv
            .file_name()
            .map_or_else(|| "courses.csv".to_owned(), |n| n.to_string_lossy().into_owned());
        info!(bytes = bytes.len(), %file_name, "uploading courses");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);

        let request = self
            .request(Method::POST, "/api/schedule/build")
            .multipart(form);
        send(request).await
    }

    /// Timetable currently assigned
    #[instrument(skip(self))]
    pub async fn schedule(&self) -> Result<TimetableResponse> {
        send(self.request(Method::GET, "/api/schedule")).await
    }

    #[instrument(skip(self))]
    pub async fn vacancy(&self) -> Result<VacancyResponse> {
        send(self.request(Method::GET, "/api/vacancy")).await
    }

    /// Add a course, the service schedules everything again
    #[instrument(skip(self), fields(course = %course.course_name))]
    pub async fn add_course(&self, course: &CourseAddRequest) -> Result<TimetableResponse> {
        send(self.request(Method::POST, "/api/courses/add").json(course)).await
    }

    #[instrument(skip(self))]
    pub async fn courses(&self) -> Result<CourseListResponse> {
        send(self.request(Method::GET, "/api/courses")).await
    }

    /// Delete a course, the service schedules everything again
    #[instrument(skip(self))]
    pub async fn delete_course(&self, id: u32) -> Result<TimetableResponse> {
        send(self.request(Method::DELETE, &format!("/api/courses/{id}"))).await
    }

    #[instrument(skip(self))]
    pub async fn versions(&self) -> Result<VersionResponse> {
        send(self.request(Method::GET, "/api/versions")).await
    }

    /// Timetable saved with a past version
    #[instrument(skip(self))]
    pub async fn version_schedule(&self, id: u32) -> Result<TimetableResponse> {
        send(self.request(Method::GET, &format!("/api/versions/{id}/schedule"))).await
    }

    #[instrument(skip(self))]
    pub async fn restore_version(&self, id: u32) -> Result<TimetableResponse> {
        send(self.request(Method::POST, &format!("/api/versions/{id}/restore"))).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    debug!(%status, url = %response.url(), "response received");

    if status.is_success() {
        // Parsed here so a malformed entry isn't mistaken for a transport failure
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        Err(api_error(response).await)
    }
}

/// Turn a failed response into an error carrying the service's explanation
async fn api_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(detail_text);

    Error::Api { status, detail }
}

fn detail_text(body: ErrorBody) -> Option<String> {
    match body.detail? {
        serde_json::Value::String(detail) if !detail.is_empty() => Some(detail),
        serde_json::Value::Null | serde_json::Value::String(_) => None,
        // Validation errors come as a list of objects
        other => Some(other.to_string()),
    }
}
