//! Client side of the backend REST API.
//!
//! Everything the front-end asks of the backend goes through [`RecordsApi`],
//! so pages and state can be driven by an in-memory double in tests.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::record::{ListPage, Record, RecordFields};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8150/csv-uploader/api";

#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Send a CSV file to be stored by the backend.
    async fn upload_csv(&self, file_name: &str, contents: Vec<u8>) -> Result<()>;

    /// Fetch page `page` (0-based) of `page_size` records plus the total count.
    async fn list_page(&self, page: usize, page_size: usize) -> Result<ListPage>;

    /// Records whose `column` equals `value`.
    async fn filter(&self, column: &str, value: &str) -> Result<Vec<Record>>;

    async fn add_record(&self, fields: &RecordFields) -> Result<Record>;

    async fn update_record(&self, id: i64, fields: &RecordFields) -> Result<Record>;

    async fn delete_record(&self, id: i64) -> Result<()>;

    /// The whole data set rendered as CSV by the backend.
    async fn download_csv(&self) -> Result<Vec<u8>>;
}

/// `RecordsApi` over HTTP.
#[derive(Clone)]
pub struct HttpRecordsApi {
    client: Client,
    base_url: String,
}

impl HttpRecordsApi {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn upload_csv(&self, file_name: &str, contents: Vec<u8>) -> Result<()> {
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload-csv-file"))
            .multipart(form)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_page(&self, page: usize, page_size: usize) -> Result<ListPage> {
        // The backend counts pages from 1.
        let response = self
            .client
            .get(self.url("/all"))
            .header("page", page.saturating_add(1).to_string())
            .header("page_size", page_size.to_string())
            .send()
            .await?;
        let body: Option<Vec<Value>> = decode_json(check_status(response).await?).await?;
        ListPage::from_body(body)
    }

    async fn filter(&self, column: &str, value: &str) -> Result<Vec<Record>> {
        let path = format!(
            "/filter/field/{}/value/{}",
            urlencoding::encode(column),
            urlencoding::encode(value)
        );
        let response = self.client.get(self.url(&path)).send().await?;
        let body: Option<Vec<Record>> = decode_json(check_status(response).await?).await?;
        Ok(body.unwrap_or_default())
    }

    async fn add_record(&self, fields: &RecordFields) -> Result<Record> {
        let response = self
            .client
            .post(self.url("/add-item"))
            .json(fields)
            .send()
            .await?;
        decode_json(check_status(response).await?).await
    }

    async fn update_record(&self, id: i64, fields: &RecordFields) -> Result<Record> {
        let response = self
            .client
            .put(self.url(&format!("/update/id/{}", id)))
            .json(fields)
            .send()
            .await?;
        decode_json(check_status(response).await?).await
    }

    async fn delete_record(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/delete/id/{}", id)))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn download_csv(&self) -> Result<Vec<u8>> {
        let response = self.client.get(self.url("/csv-file")).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}
