use axum::{
    Extension,
    extract::{Multipart, State},
    response::{Html, Redirect},
};
use log::info;
use serde::Serialize;
use std::sync::Arc;

use super::{Notice, PendingUpload, SessionHandle, render};
use crate::app::AppState;
use crate::error::{Error, Result};
use crate::loader::parse_csv_bytes;
use crate::table::{TableMode, TableView, render_table};

const FILE_FIELD: &str = "file";
const DEFAULT_FILE_NAME: &str = "upload.csv";

#[derive(Serialize)]
struct UploadPage {
    title: &'static str,
    notice: Option<Notice>,
    file_name: Option<String>,
    data_rows: usize,
    preview: Option<TableView>,
}

/// `GET /upload`
pub async fn show_upload(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Html<String>> {
    let mut session = session.lock().await;
    let notice = session.notice.take();

    let view = match &session.upload {
        Some(pending) => UploadPage {
            title: "Enviar",
            notice,
            file_name: Some(pending.file_name.clone()),
            data_rows: pending.rows.len().saturating_sub(1),
            preview: render_table(&pending.rows, TableMode::Preview),
        },
        None => UploadPage {
            title: "Enviar",
            notice,
            file_name: None,
            data_rows: 0,
            preview: None,
        },
    };

    render(&state, "upload", &view)
}

/// `POST /upload/preview`: parse the chosen file and keep it for sending.
pub async fn preview_upload(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    multipart: Multipart,
) -> Redirect {
    let received = read_file(multipart).await.and_then(|(file_name, bytes)| {
        let rows = parse_csv_bytes(&bytes, state.trailing_lines)?;
        Ok(PendingUpload {
            file_name,
            bytes,
            rows,
        })
    });

    let mut session = session.lock().await;
    match received {
        Ok(pending) => {
            info!("previewing {} ({} rows)", pending.file_name, pending.rows.len());
            session.upload = Some(pending);
        }
        Err(e) => session.failure(&e),
    }
    Redirect::to("/upload")
}

/// `POST /upload/enviar`: send this session's pending file to the backend.
pub async fn send_upload(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Redirect {
    let mut session = session.lock().await;

    let Some(pending) = session.upload.as_ref() else {
        session.failure(&Error::Validation(
            "Selecione um arquivo CSV antes de enviar.".to_string(),
        ));
        return Redirect::to("/upload");
    };

    let file_name = pending.file_name.clone();
    match state.api.upload_csv(&file_name, pending.bytes.clone()).await {
        Ok(()) => {
            info!("uploaded {}", file_name);
            session.upload = None;
            session.store.invalidate();
            session.form.cancel();
            session.success("Arquivo enviado com sucesso.");
            Redirect::to("/consultar")
        }
        Err(e) => {
            session.failure(&e);
            Redirect::to("/upload")
        }
    }
}

async fn read_file(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    let unreadable = |e: axum::extract::multipart::MultipartError| {
        Error::Validation(format!("Falha ao ler o arquivo enviado: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let bytes = field.bytes().await.map_err(unreadable)?;
        if bytes.is_empty() {
            break;
        }
        return Ok((file_name, bytes.to_vec()));
    }

    Err(Error::Validation("Selecione um arquivo CSV.".to_string()))
}
