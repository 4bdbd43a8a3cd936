use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;
use crate::loader::TrailingLines;

/// Runtime settings. Every flag falls back to an environment variable, and a
/// `.env` file in the working directory is read before parsing.
#[derive(Debug, Clone, Parser)]
#[command(name = "csv-uploader", version, about = "Web front-end for the CSV uploader backend")]
pub struct Settings {
    /// Address the web front-end listens on.
    #[arg(long, env = "CSV_UPLOADER_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Base URL of the backend REST API.
    #[arg(long, env = "CSV_UPLOADER_BACKEND_URL", default_value = DEFAULT_BASE_URL)]
    pub backend_url: String,

    /// Records per page on the browse page.
    #[arg(
        long,
        env = "CSV_UPLOADER_PAGE_SIZE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub page_size: u16,

    /// Whether blank lines at the end of an uploaded file become rows.
    #[arg(long, env = "CSV_UPLOADER_TRAILING_LINES", value_enum, default_value_t = TrailingLines::Drop)]
    pub trailing_lines: TrailingLines,

    /// Timeout for backend requests; none by default.
    #[arg(long, env = "CSV_UPLOADER_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Largest accepted upload, in bytes.
    #[arg(long, env = "CSV_UPLOADER_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend_url: DEFAULT_BASE_URL.to_string(),
            page_size: 10,
            trailing_lines: TrailingLines::Drop,
            request_timeout_secs: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}
