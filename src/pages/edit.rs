use axum::{
    Extension, Form,
    extract::{Path, State, rejection::FormRejection},
    response::{Html, Redirect},
};
use std::sync::Arc;

use super::browse::{incomplete_form, render_browse};
use super::{Session, SessionHandle};
use crate::api::RecordsApi;
use crate::app::AppState;
use crate::error::{Error, Result};
use crate::record::{Field, RecordFields};

/// `GET /editar/:id`
///
/// Shows the browse page with the form editing record `id`. A record that
/// cannot be found is reported as a notice and the form stays as it was.
pub async fn show_edit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let mut session = session.lock().await;

    if !session.store.is_loaded() {
        let size = session.store.page_size();
        let _ = session.store.load_page(state.api.as_ref(), 0, size).await;
    }
    if let Err(e) = select_for_edit(&mut session, state.api.as_ref(), id).await {
        session.failure(&e);
    }

    render_browse(&state, &mut session)
}

/// `POST /editar/:id`
///
/// # Returns
/// * `Redirect` - To `/consultar` after a successful update, back to the
///   edit page otherwise so the typed values can be corrected
pub async fn submit_edit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(id): Path<i64>,
    form: std::result::Result<Form<RecordFields>, FormRejection>,
) -> Redirect {
    let mut guard = session.lock().await;
    let session = &mut *guard;

    let submitted = async {
        let Form(fields) = form.map_err(incomplete_form)?;
        select_for_edit(session, state.api.as_ref(), id).await?;
        session.form.fill(fields)?;
        session.form.submit(state.api.as_ref()).await
    }
    .await;

    match submitted {
        Ok(_) => {
            session.success(format!("Registro {} atualizado.", id));
            let _ = session.store.refresh(state.api.as_ref()).await;
            Redirect::to("/consultar")
        }
        Err(e) => {
            session.failure(&e);
            Redirect::to(&format!("/editar/{}", id))
        }
    }
}

/// Put record `id` in the form unless it is already there.
///
/// The record comes from the rows on screen when present, otherwise from
/// the backend through the filter endpoint.
async fn select_for_edit(session: &mut Session, api: &dyn RecordsApi, id: i64) -> Result<()> {
    if session.form.editing_id() == Some(id) {
        return Ok(());
    }
    if session.form.select_row(&[id.to_string()], session.store.records()) {
        return Ok(());
    }

    let record = api
        .filter(Field::Id.as_str(), &id.to_string())
        .await?
        .into_iter()
        .find(|record| record.id == id)
        .ok_or_else(|| Error::Validation(format!("Registro {} não encontrado.", id)))?;
    session.form.edit(record);
    Ok(())
}
