use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
};
use handlebars::Handlebars;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{HttpRecordsApi, RecordsApi};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::loader::TrailingLines;
use crate::pages::{Sessions, attach_session, browse, edit, upload};

const TEMPLATES: [(&str, &str); 2] = [
    ("upload", include_str!("./templates/upload.hbs")),
    ("browse", include_str!("./templates/browse.hbs")),
];

const PARTIALS: [(&str, &str); 5] = [
    ("layout_start", include_str!("./templates/layout_start.hbs")),
    ("layout_end", include_str!("./templates/layout_end.hbs")),
    ("notice", include_str!("./templates/notice.hbs")),
    ("table", include_str!("./templates/table.hbs")),
    ("record_form", include_str!("./templates/record_form.hbs")),
];

/// Shared by every request. Per-browser state lives in `sessions`.
pub struct AppState {
    pub api: Arc<dyn RecordsApi>,
    pub templates: Handlebars<'static>,
    pub page_size: usize,
    pub trailing_lines: TrailingLines,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(api: Arc<dyn RecordsApi>, settings: &Settings) -> Result<Self> {
        let mut templates = Handlebars::new();
        for (name, source) in PARTIALS {
            templates
                .register_partial(name, source)
                .map_err(|e| Error::Template(e.to_string()))?;
        }
        for (name, source) in TEMPLATES {
            templates
                .register_template_string(name, source)
                .map_err(|e| Error::Template(e.to_string()))?;
        }

        let page_size = settings.page_size as usize;
        Ok(Self {
            api,
            templates,
            page_size,
            trailing_lines: settings.trailing_lines,
            sessions: Sessions::new(page_size),
        })
    }
}

/// All client routes.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/upload") }))
        .route("/upload", get(upload::show_upload))
        .route("/upload/preview", post(upload::preview_upload))
        .route("/upload/enviar", post(upload::send_upload))
        .route("/consultar", get(browse::show_browse))
        .route("/consultar/pesquisar", post(browse::search))
        .route("/consultar/limpar", post(browse::clear_search))
        .route("/consultar/download", get(browse::download))
        .route("/consultar/novo", post(browse::start_add))
        .route("/consultar/adicionar", post(browse::submit_add))
        .route("/consultar/cancelar", post(browse::cancel_form))
        .route("/consultar/excluir/:id", post(browse::delete_record))
        .route("/editar/:id", get(edit::show_edit).post(edit::submit_edit))
        .layer(middleware::from_fn_with_state(state.clone(), attach_session))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

pub async fn run(settings: Settings) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let api = HttpRecordsApi::new(settings.backend_url.clone(), settings.request_timeout())?;
    info!("using backend at {}", api.base_url());

    let state = Arc::new(AppState::new(Arc::new(api), &settings)?);
    let app = router(state, settings.max_upload_bytes);

    let listener = TcpListener::bind(settings.listen).await?;
    info!("listening on http://{}", settings.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
