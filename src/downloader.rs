use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::Result;
use crate::loader::{Row, TrailingLines, parse_csv_bytes};

pub const DOWNLOAD_FILE_NAME: &str = "planilha.csv";

/// The data set as served by the backend's CSV export.
#[derive(Debug, Clone)]
pub struct CsvDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvDownload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            bytes,
        }
    }

    /// Value of the `Content-Disposition` header
    ///
    /// # Examples
    /// ```
    /// use csv_uploader::downloader::CsvDownload;
    ///
    /// let download = CsvDownload::new(b"Nome\nAna\n".to_vec());
    /// assert_eq!(download.content_disposition(), "attachment; filename=\"planilha.csv\"");
    /// ```
    pub fn content_disposition(&self) -> String {
        let name = self.file_name.replace(['"', '\\'], "_");
        format!("attachment; filename=\"{}\"", name)
    }

    /// Parse the export back into rows.
    pub fn rows(&self, trailing: TrailingLines) -> Result<Vec<Row>> {
        parse_csv_bytes(&self.bytes, trailing)
    }
}

impl IntoResponse for CsvDownload {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            Body::from(self.bytes),
        )
            .into_response()
    }
}
