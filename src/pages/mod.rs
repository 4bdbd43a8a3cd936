//! Route handlers, one module per client page.

pub mod browse;
pub mod edit;
pub mod upload;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{Error, Result};
use crate::form::RecordForm;
use crate::loader::Row;
use crate::store::TabularStore;

/// One browser's state, kept between its requests.
pub struct Session {
    pub store: TabularStore,
    pub form: RecordForm,
    pub upload: Option<PendingUpload>,
    pub notice: Option<Notice>,
}

impl Session {
    pub fn new(page_size: usize) -> Self {
        Self {
            store: TabularStore::new(page_size),
            form: RecordForm::new(),
            upload: None,
            notice: None,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        });
    }

    /// Record a failed action; shown once on the next page render.
    pub fn failure(&mut self, err: &Error) {
        log::warn!("action failed: {}", err);
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            message: err.user_message(),
        });
    }
}

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Sessions untouched for this long are dropped.
const SESSION_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared handle to one browser's session.
pub type SessionHandle = Arc<Mutex<Session>>;

struct SessionEntry {
    session: SessionHandle,
    last_seen: Instant,
}

/// Every open session, keyed by the id stored in the browser's cookie.
pub struct Sessions {
    page_size: usize,
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl Sessions {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the session behind `id`, refreshing its idle timer
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Start a fresh session and return its id
    ///
    /// Expired sessions are swept out at the same time.
    pub async fn open(&self) -> (String, SessionHandle) {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(self.page_size)));

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) < SESSION_IDLE);
        entries.insert(
            id.clone(),
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (id, session)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Middleware giving every request its browser's [`Session`]
///
/// Reads the session id from the `session` cookie. An unknown or missing id
/// opens a new session and sets the cookie on the response. Handlers receive
/// the session through `Extension<SessionHandle>`.
///
/// # Arguments
/// * `state` - Application state holding the session registry
/// * `jar` - Cookies sent by the browser
/// * `request` - The request to forward
/// * `next` - The rest of the router
///
/// # Returns
/// * `Response` - The handler's response, plus the cookie for a new session
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let known = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get(cookie.value()).await,
        None => None,
    };

    let (session, jar) = match known {
        Some(session) => (session, jar),
        None => {
            let (id, session) = state.sessions.open().await;
            log::debug!("opened session {}", id);
            let cookie = Cookie::build((SESSION_COOKIE, id))
                .path("/")
                .http_only(true)
                .build();
            (session, jar.add(cookie))
        }
    };

    request.extensions_mut().insert(session);
    (jar, next.run(request).await).into_response()
}

/// A parsed file waiting to be sent to the backend.
pub struct PendingUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message about the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

pub(crate) fn render<T: Serialize>(state: &AppState, template: &str, view: &T) -> Result<Html<String>> {
    state
        .templates
        .render(template, view)
        .map(Html)
        .map_err(|e| Error::Template(e.to_string()))
}
