pub mod dto;

use std::env;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::DatesError;
use crate::models::PagedResult;

#[derive(Clone, Debug)]
pub struct LmsConfig {
    pub base_url: String,
    pub api_token: String,
    pub username: String,
}

impl LmsConfig {
    pub fn new_from_env() -> Result<Self, DatesError> {
        let base_url = env::var("LMS_BASE_URL")
            .map_err(|_| DatesError::Config("LMS_BASE_URL is not set".to_string()))?;
        let api_token = env::var("LMS_API_TOKEN")
            .map_err(|_| DatesError::Config("LMS_API_TOKEN is not set".to_string()))?;
        let username = env::var("LMS_USERNAME")
            .map_err(|_| DatesError::Config("LMS_USERNAME is not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            username,
        })
    }
}

/// Remote due-dates source.
#[async_trait]
pub trait DatesApi: Send + Sync {
    async fn fetch_page(&self, username: &str, page: u32) -> Result<PagedResult, DatesError>;
    async fn shift_due_dates(&self, course_ids: &[String]) -> Result<(), DatesError>;
}

pub struct LmsHttpClient {
    client: Client,
    config: LmsConfig,
}

impl LmsHttpClient {
    pub fn new(config: LmsConfig) -> Result<Self, DatesError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DatesError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DatesApi for LmsHttpClient {
    async fn fetch_page(&self, username: &str, page: u32) -> Result<PagedResult, DatesError> {
        let url = format!(
            "{}/api/mobile/v1/users/{}/course_dates?page={}",
            self.config.base_url, username, page
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DatesError::Api { status, body });
        }

        let body_text = response.text().await?;
        let parsed: dto::UserDatesResponse = serde_json::from_str(&body_text)?;

        let has_more = parsed.next.is_some();
        let mut records = Vec::with_capacity(parsed.results.len());
        for row in parsed.results {
            let course_id = row.course_id.clone();
            match row.into_domain() {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!("Dropping due date with unparseable date in {}", course_id);
                }
            }
        }

        Ok(PagedResult { records, has_more })
    }

    async fn shift_due_dates(&self, course_ids: &[String]) -> Result<(), DatesError> {
        let url = format!(
            "{}/api/course_experience/v1/reset_course_deadlines",
            self.config.base_url
        );

        let body = dto::ShiftDueDatesBody {
            course_keys: course_ids.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DatesError::Api { status, body });
        }

        Ok(())
    }
}

/// Source that always reports an empty list; useful for wiring and tests.
pub struct NoopDatesApi;

#[async_trait]
impl DatesApi for NoopDatesApi {
    async fn fetch_page(&self, _username: &str, _page: u32) -> Result<PagedResult, DatesError> {
        Ok(PagedResult {
            records: Vec::new(),
            has_more: false,
        })
    }

    async fn shift_due_dates(&self, _course_ids: &[String]) -> Result<(), DatesError> {
        Ok(())
    }
}
