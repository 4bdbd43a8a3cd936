use axum::{
    Extension, Form,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Notice, Session, SessionHandle, render};
use crate::app::AppState;
use crate::downloader::CsvDownload;
use crate::error::{Error, Result};
use crate::form::FormState;
use crate::record::{Field, RecordFields};
use crate::store::{Pagination, ViewMode};
use crate::table::{TableMode, TableView, render_table};

const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub column: String,
    pub value: String,
}

#[derive(Serialize)]
struct BrowsePage {
    title: &'static str,
    notice: Option<Notice>,
    error: Option<String>,
    table: Option<TableView>,
    total_count: u64,
    pagination: Option<PaginationView>,
    filter: FilterView,
    show_add: bool,
    form: Option<FormView>,
}

#[derive(Serialize)]
struct PaginationView {
    page_number: usize,
    page_count: usize,
    total_count: u64,
    first_item: u64,
    last_item: u64,
    previous_href: Option<String>,
    next_href: Option<String>,
    sizes: Vec<PageSizeOption>,
}

#[derive(Serialize)]
struct PageSizeOption {
    size: usize,
    href: String,
    selected: bool,
}

#[derive(Serialize)]
struct FilterView {
    active: bool,
    column: String,
    value: String,
    columns: Vec<ColumnOption>,
}

#[derive(Serialize)]
struct ColumnOption {
    name: &'static str,
    selected: bool,
}

#[derive(Serialize)]
pub(crate) struct FormView {
    action: String,
    submit_label: &'static str,
    id: Option<i64>,
    fields: Vec<FormFieldView>,
}

#[derive(Serialize)]
struct FormFieldView {
    name: &'static str,
    label: &'static str,
    value: String,
    placeholder: Option<&'static str>,
}

/// `GET /consultar`
///
/// Loads the requested page on the first visit or when the query names a
/// page or page size. A rejected page size is reported as a notice; backend
/// failures show through the store's load error.
///
/// # Arguments
/// * `state` - Application state
/// * `session` - The browser's session
/// * `query` - Optional `page` (0-based) and `page_size`
///
/// # Returns
/// * `Result<Html<String>>` - The rendered browse page
pub async fn show_browse(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Query(query): Query<BrowseQuery>,
) -> Result<Html<String>> {
    let mut guard = session.lock().await;
    let session = &mut *guard;

    let requested = query.page.is_some() || query.page_size.is_some();
    if requested || !session.store.is_loaded() {
        let store = &mut session.store;
        let size = query.page_size.unwrap_or(store.page_size());
        // A new page size starts over from the first page.
        let page = match query.page {
            Some(page) => page,
            None if size != store.page_size() => 0,
            None => store.page(),
        };
        let loaded = store.load_page(state.api.as_ref(), page, size).await;
        if let Err(e @ Error::Validation(_)) = loaded {
            session.failure(&e);
        }
    }

    render_browse(&state, session)
}

/// Render the browse page from the current session.
pub(crate) fn render_browse(state: &AppState, session: &mut Session) -> Result<Html<String>> {
    let notice = session.notice.take();
    let store = &session.store;

    let filter = match store.view() {
        ViewMode::Paginated => FilterView {
            active: false,
            column: String::new(),
            value: String::new(),
            columns: column_options(None),
        },
        ViewMode::Filtered { column, value } => FilterView {
            active: true,
            column: column.as_str().to_string(),
            value: value.clone(),
            columns: column_options(Some(*column)),
        },
    };

    let view = BrowsePage {
        title: "Consultar",
        notice,
        error: store.last_error().map(str::to_string),
        table: render_table(&store.rows(), TableMode::Browse),
        total_count: store.total_count(),
        pagination: store.pagination().map(pagination_view),
        filter,
        show_add: !matches!(session.form.state(), FormState::Adding(_)),
        form: form_view(session.form.state()),
    };

    render(state, "browse", &view)
}

/// `POST /consultar/pesquisar`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    search: std::result::Result<Form<SearchForm>, FormRejection>,
) -> Redirect {
    let mut session = session.lock().await;
    let applied = match search {
        Ok(Form(search)) => {
            session
                .store
                .apply_filter(state.api.as_ref(), &search.column, &search.value)
                .await
        }
        Err(rejection) => Err(incomplete_form(rejection)),
    };
    if let Err(e) = applied {
        session.failure(&e);
    }
    Redirect::to("/consultar")
}

/// `POST /consultar/limpar`
pub async fn clear_search(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Redirect {
    let mut session = session.lock().await;
    if let Err(e) = session.store.clear_filter(state.api.as_ref()).await {
        session.failure(&e);
    }
    Redirect::to("/consultar")
}

/// `GET /consultar/download`
pub async fn download(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Response {
    match state.api.download_csv().await {
        Ok(bytes) => {
            info!("serving csv export ({} bytes)", bytes.len());
            CsvDownload::new(bytes).into_response()
        }
        Err(e) => {
            session.lock().await.failure(&e);
            Redirect::to("/consultar").into_response()
        }
    }
}

/// `POST /consultar/novo`
pub async fn start_add(Extension(session): Extension<SessionHandle>) -> Redirect {
    session.lock().await.form.start_add();
    Redirect::to("/consultar")
}

/// `POST /consultar/cancelar`
pub async fn cancel_form(Extension(session): Extension<SessionHandle>) -> Redirect {
    session.lock().await.form.cancel();
    Redirect::to("/consultar")
}

/// `POST /consultar/adicionar`
///
/// Submits the add form and refreshes the rows on success. Every outcome,
/// including a form with missing fields, ends up in the session notice.
pub async fn submit_add(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    form: std::result::Result<Form<RecordFields>, FormRejection>,
) -> Redirect {
    let mut guard = session.lock().await;
    let session = &mut *guard;

    if !matches!(session.form.state(), FormState::Adding(_)) {
        session.form.start_add();
    }
    let submitted = match form {
        Ok(Form(fields)) => match session.form.fill(fields) {
            Ok(()) => session.form.submit(state.api.as_ref()).await,
            Err(e) => Err(e),
        },
        Err(rejection) => Err(incomplete_form(rejection)),
    };

    match submitted {
        Ok(submitted) => {
            session.success(format!("Registro {} adicionado.", submitted.record().id));
            let _ = session.store.refresh(state.api.as_ref()).await;
        }
        Err(e) => session.failure(&e),
    }
    Redirect::to("/consultar")
}

/// `POST /consultar/excluir/:id`
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(id): Path<i64>,
) -> Redirect {
    let mut session = session.lock().await;
    match state.api.delete_record(id).await {
        Ok(()) => {
            info!("deleted record {}", id);
            if session.form.editing_id() == Some(id) {
                session.form.cancel();
            }
            session.success(format!("Registro {} excluído.", id));
            let _ = session.store.refresh(state.api.as_ref()).await;
        }
        Err(e) => session.failure(&e),
    }
    Redirect::to("/consultar")
}

/// Turn a rejected form body into a user-facing validation error.
pub(crate) fn incomplete_form(rejection: FormRejection) -> Error {
    Error::Validation(format!("Formulário incompleto: {}", rejection.body_text()))
}

fn column_options(selected: Option<Field>) -> Vec<ColumnOption> {
    Field::ALL
        .into_iter()
        .map(|field| ColumnOption {
            name: field.as_str(),
            selected: Some(field) == selected,
        })
        .collect()
}

fn pagination_view(p: Pagination) -> PaginationView {
    let href = |page: usize, size: usize| format!("/consultar?page={}&page_size={}", page, size);
    PaginationView {
        page_number: p.page + 1,
        page_count: p.page_count,
        total_count: p.total_count,
        first_item: p.first_item,
        last_item: p.last_item,
        previous_href: p.previous_page.map(|page| href(page, p.page_size)),
        next_href: p.next_page.map(|page| href(page, p.page_size)),
        sizes: PAGE_SIZES
            .into_iter()
            .map(|size| PageSizeOption {
                size,
                href: href(0, size),
                selected: size == p.page_size,
            })
            .collect(),
    }
}

fn form_view(state: &FormState) -> Option<FormView> {
    let (action, submit_label, id, values) = match state {
        FormState::Idle => return None,
        FormState::Adding(fields) => ("/consultar/adicionar".to_string(), "Adicionar", None, fields),
        FormState::Editing(record) => (
            format!("/editar/{}", record.id),
            "Atualizar",
            Some(record.id),
            &record.fields,
        ),
    };

    let fields = Field::EDITABLE
        .into_iter()
        .map(|field| FormFieldView {
            name: field.as_str(),
            label: field.label(),
            value: values.get(field).unwrap_or_default().to_string(),
            placeholder: field.is_date().then_some("aaaa/mm/dd"),
        })
        .collect();

    Some(FormView {
        action,
        submit_label,
        id,
        fields,
    })
}
