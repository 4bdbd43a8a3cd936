use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the front-end can hit, from the backend round-trip to the
/// rendering of a page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected backend payload: {0}")]
    Decode(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unreadable csv: {0}")]
    Parse(String),

    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message shown to the user in a page notice.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => "Não foi possível conectar ao servidor.".to_string(),
            Error::Status { status, .. } => {
                format!("O servidor respondeu com erro (status {}).", status)
            }
            Error::Decode(_) => "Resposta inesperada do servidor.".to_string(),
            Error::Validation(msg) | Error::Parse(msg) => msg.clone(),
            Error::Template(_) | Error::Io(_) => "Erro interno.".to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Parse(_) => StatusCode::BAD_REQUEST,
            Error::Network(_) | Error::Status { .. } | Error::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Template(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        log::error!("request failed: {}", self);
        (self.status_code(), self.user_message()).into_response()
    }
}
