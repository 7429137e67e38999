//! Browser front end served over HTTP.
//!
//! Pages are plain server-rendered HTML. Every value taken from a note or a
//! request is escaped before it reaches the page; store calls run on the
//! blocking pool since they do synchronous file I/O.
use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use clap::ValueEnum;
use log::{error, info, warn};
use serde::Deserialize;

use crate::{
    escape_html, is_placeholder_body, Config, DeleteOutcome, Highlighter, Markup, MatchMode,
    MemoError, Note, NoteStore, Result, Scope, SearchQuery, Snapshot, UpdateOutcome,
};

#[derive(Clone)]
struct WebState {
    store: Arc<NoteStore>,
    config: Arc<Config>,
}

/// Builds the application router over a shared store.
pub fn router(store: Arc<NoteStore>, config: Config) -> Router {
    let state = WebState {
        store,
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index))
        .route("/notes/:id", get(show_note))
        .route("/add", get(add_form).post(add_note))
        .route("/notes/:id/edit", get(edit_form).post(edit_note))
        .route("/notes/:id/delete", get(delete_form).post(delete_note))
        .route("/search", get(search))
        .with_state(state)
}

/// Binds `addr` and serves the web UI until the process is stopped.
pub async fn serve(store: Arc<NoteStore>, config: Config, addr: &str) -> Result<()> {
    let app = router(store, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MemoError::Server {
            message: format!("cannot listen on {addr}: {e}"),
        })?;

    info!("Web UI listening on http://{}", addr);
    println!("Serving notes on http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, app)
        .await
        .map_err(|e| MemoError::Server {
            message: e.to_string(),
        })
}

/// An error page with its status code.
#[derive(Debug)]
struct WebError {
    status: StatusCode,
    message: String,
}

impl WebError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(id: u64) -> Self {
        MemoError::NoteNotFound { id }.into()
    }
}

impl From<MemoError> for WebError {
    fn from(err: MemoError) -> Self {
        let status = match &err {
            MemoError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MemoError::NoteNotFound { .. } => StatusCode::NOT_FOUND,
            MemoError::NothingToUpdate => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        let message = match err.hint() {
            Some(hint) => format!("{err} ({hint})"),
            None => err.to_string(),
        };
        Self { status, message }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let content = format!(
            "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back to notes</a></p>",
            escape_html(&self.message)
        );
        (self.status, page(self.status.as_str(), &content)).into_response()
    }
}

/// Runs `f` against the store on the blocking pool.
async fn with_store<T, F>(state: &WebState, f: F) -> std::result::Result<T, WebError>
where
    F: FnOnce(&NoteStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| {
            error!("Store task failed: {}", e);
            WebError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal error".to_string(),
            }
        })
}

#[derive(Debug, Deserialize)]
struct NoteForm {
    #[serde(default)]
    title: String,
    body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "match")]
    match_mode: Option<String>,
    #[serde(rename = "in")]
    scope: Option<String>,
    case: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<String>,
}

async fn index(State(state): State<WebState>) -> std::result::Result<Html<String>, WebError> {
    let snapshot = with_store(&state, |store| store.load()).await?;

    let mut content = damage_warning(&snapshot);
    content.push_str(&search_form(&SearchParams::default()));
    content.push_str("<p><a href=\"/add\">New note</a></p>\n");

    if snapshot.notes.is_empty() {
        content.push_str("<p>No notes yet.</p>\n");
    } else {
        content.push_str("<ul>\n");
        for note in &snapshot.notes {
            content.push_str(&note_row(note, &escape_html(&note.title), None));
        }
        content.push_str("</ul>\n");
    }

    Ok(page("Notes", &content))
}

async fn show_note(
    State(state): State<WebState>,
    Path(id): Path<u64>,
) -> std::result::Result<Html<String>, WebError> {
    let note = with_store(&state, move |store| store.get(id))
        .await?
        .ok_or_else(|| WebError::not_found(id))?;

    let mut content = format!(
        "<p><small>created {}",
        escape_html(note.created_at.as_str())
    );
    if let Some(updated) = &note.updated_at {
        content.push_str(&format!(", updated {}", escape_html(updated.as_str())));
    }
    content.push_str("</small></p>\n");
    content.push_str(&format!("<pre>{}</pre>\n", escape_html(&note.body)));
    content.push_str(&format!(
        "<p><a href=\"/notes/{id}/edit\">Edit</a> | <a href=\"/notes/{id}/delete\">Delete</a> | <a href=\"/\">Back</a></p>\n"
    ));

    Ok(page(&format!("#{} {}", note.id, note.title), &content))
}

async fn add_form() -> Html<String> {
    page("New note", &note_form("/add", "", "", None))
}

async fn add_note(
    State(state): State<WebState>,
    Form(form): Form<NoteForm>,
) -> std::result::Result<Response, WebError> {
    let NoteForm { title, body } = form;
    let (t, b) = (title.clone(), body.clone());
    let added = with_store(&state, move |store| store.add(&t, b.as_deref())).await?;

    match added {
        Ok(note) => Ok(Redirect::to(&format!("/notes/{}", note.id)).into_response()),
        Err(MemoError::Validation(err)) => {
            let html = note_form(
                "/add",
                &title,
                body.as_deref().unwrap_or_default(),
                Some(&format!("{err} ({})", err.hint())),
            );
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page("New note", &html)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn edit_form(
    State(state): State<WebState>,
    Path(id): Path<u64>,
) -> std::result::Result<Html<String>, WebError> {
    let note = with_store(&state, move |store| store.get(id))
        .await?
        .ok_or_else(|| WebError::not_found(id))?;

    let body = if is_placeholder_body(&note.body) {
        ""
    } else {
        note.body.as_str()
    };
    let action = format!("/notes/{id}/edit");
    Ok(page(
        &format!("Edit #{id}"),
        &note_form(&action, &note.title, body, None),
    ))
}

async fn edit_note(
    State(state): State<WebState>,
    Path(id): Path<u64>,
    Form(form): Form<NoteForm>,
) -> std::result::Result<Response, WebError> {
    let NoteForm { title, body } = form;
    let (t, b) = (title.clone(), body.clone().unwrap_or_default());
    let updated = with_store(&state, move |store| store.update(id, Some(&t), Some(&b))).await?;

    match updated {
        Ok(UpdateOutcome::Updated(note)) => {
            Ok(Redirect::to(&format!("/notes/{}", note.id)).into_response())
        }
        Ok(UpdateOutcome::NotFound) => Err(WebError::not_found(id)),
        Ok(UpdateOutcome::NothingRequested) => Err(MemoError::NothingToUpdate.into()),
        Err(MemoError::Validation(err)) => {
            let html = note_form(
                &format!("/notes/{id}/edit"),
                &title,
                body.as_deref().unwrap_or_default(),
                Some(&format!("{err} ({})", err.hint())),
            );
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page(&format!("Edit #{id}"), &html)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn delete_form(
    State(state): State<WebState>,
    Path(id): Path<u64>,
) -> std::result::Result<Html<String>, WebError> {
    let note = with_store(&state, move |store| store.get(id))
        .await?
        .ok_or_else(|| WebError::not_found(id))?;

    let content = format!(
        "<p>Delete note #{} \"{}\"?</p>\n\
         <form method=\"post\" action=\"/notes/{}/delete\"><button type=\"submit\">Delete</button></form>\n\
         <p><a href=\"/notes/{}\">Cancel</a></p>\n",
        id,
        escape_html(&note.title),
        id,
        id
    );
    Ok(page(&format!("Delete #{id}"), &content))
}

async fn delete_note(
    State(state): State<WebState>,
    Path(id): Path<u64>,
) -> std::result::Result<Response, WebError> {
    match with_store(&state, move |store| store.delete(id)).await?? {
        DeleteOutcome::Deleted { .. } => Ok(Redirect::to("/").into_response()),
        DeleteOutcome::NotFound => Err(WebError::not_found(id)),
    }
}

async fn search(
    State(state): State<WebState>,
    Query(params): Query<SearchParams>,
) -> std::result::Result<Html<String>, WebError> {
    let mut content = search_form(&params);

    let Some(query) = parse_search(&params)? else {
        return Ok(page("Search", &content));
    };

    let snapshot = with_store(&state, |store| store.load()).await?;
    content.insert_str(0, &damage_warning(&snapshot));
    let results = query.run(&snapshot.notes);
    let highlighter = Highlighter::for_query(&query, Markup::Html);

    content.push_str(&format!(
        "<p>{} result{}</p>\n",
        results.len(),
        crate::plural(results.len())
    ));
    if !results.is_empty() {
        content.push_str("<ul>\n");
        for note in &results {
            let snippet = (query.scope != Scope::Title)
                .then(|| highlighter.snippet(&note.body, state.config.snippet_width));
            content.push_str(&note_row(
                note,
                &highlighter.highlight(&note.title),
                snippet.as_deref(),
            ));
        }
        content.push_str("</ul>\n");
    }

    Ok(page("Search", &content))
}

/// `None` when no keywords were given.
fn parse_search(params: &SearchParams) -> std::result::Result<Option<SearchQuery>, WebError> {
    fn given(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    let keywords: Vec<&str> = given(&params.q)
        .map(|q| q.split_whitespace().collect())
        .unwrap_or_default();
    if keywords.is_empty() {
        return Ok(None);
    }

    let mut query = SearchQuery::new(keywords);
    if let Some(mode) = given(&params.match_mode) {
        query.mode = <MatchMode as ValueEnum>::from_str(mode, true)
            .map_err(|_| WebError::bad_request(format!("unknown match mode: {mode}")))?;
    }
    if let Some(scope) = given(&params.scope) {
        query.scope = <Scope as ValueEnum>::from_str(scope, true)
            .map_err(|_| WebError::bad_request(format!("unknown search scope: {scope}")))?;
    }
    query.case_sensitive = given(&params.case).is_some_and(|c| c == "on");
    query.from = given(&params.from).map(parse_date).transpose()?;
    query.to = given(&params.to).map(parse_date).transpose()?;
    if let Some(limit) = given(&params.limit) {
        query.limit = limit
            .parse()
            .map_err(|_| WebError::bad_request(format!("invalid limit: {limit}")))?;
    }

    Ok(Some(query))
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, WebError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| WebError::bad_request(format!("invalid date (expected YYYY-MM-DD): {value}")))
}

/// Error banner for a store that loaded as empty because it was damaged.
fn damage_warning(snapshot: &Snapshot) -> String {
    match snapshot.warning() {
        Some(warning) => {
            warn!("{}", warning);
            format!("<p class=\"error\">{}</p>\n", escape_html(&warning))
        }
        None => String::new(),
    }
}

fn page(title: &str, content: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>body{{font-family:sans-serif;max-width:48rem;margin:2rem auto}}\
         .error{{color:#b00}}mark{{background:#ff6}}pre{{white-space:pre-wrap}}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n{content}</body>\n</html>\n",
        title = escape_html(title),
        content = content
    ))
}

/// `title_html` and `snippet_html` must already be escaped.
fn note_row(note: &Note, title_html: &str, snippet_html: Option<&str>) -> String {
    let mut row = format!(
        "<li><a href=\"/notes/{}\">#{} {}</a> <small>{}</small>",
        note.id,
        note.id,
        title_html,
        escape_html(&note.created_at.short_display())
    );
    if let Some(snippet) = snippet_html {
        row.push_str(&format!("<br><small>{snippet}</small>"));
    }
    row.push_str("</li>\n");
    row
}

fn note_form(action: &str, title: &str, body: &str, error: Option<&str>) -> String {
    let mut html = String::new();
    if let Some(error) = error {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(error)));
    }
    html.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\n\
         <p><input name=\"title\" value=\"{}\" placeholder=\"Title\" required></p>\n\
         <p><textarea name=\"body\" rows=\"8\" cols=\"60\" placeholder=\"Body\">{}</textarea></p>\n\
         <p><button type=\"submit\">Save</button> <a href=\"/\">Cancel</a></p>\n</form>\n",
        escape_html(action),
        escape_html(title),
        escape_html(body)
    ));
    html
}

fn search_form(params: &SearchParams) -> String {
    let value = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());
    let selected = |v: &Option<String>, option: &str| {
        if v.as_deref() == Some(option) {
            " selected"
        } else {
            ""
        }
    };

    format!(
        "<form method=\"get\" action=\"/search\">\n\
         <input name=\"q\" value=\"{q}\" placeholder=\"Keywords\">\n\
         <select name=\"match\"><option value=\"any\">any</option><option value=\"all\"{all}>all</option></select>\n\
         <select name=\"in\"><option value=\"both\">both</option><option value=\"title\"{title}>title</option><option value=\"body\"{body}>body</option></select>\n\
         <label><input type=\"checkbox\" name=\"case\"{case}> case-sensitive</label>\n\
         <input type=\"date\" name=\"from\" value=\"{from}\"> <input type=\"date\" name=\"to\" value=\"{to}\">\n\
         <button type=\"submit\">Search</button>\n</form>\n",
        q = value(&params.q),
        all = selected(&params.match_mode, "all"),
        title = selected(&params.scope, "title"),
        body = selected(&params.scope, "body"),
        case = if params.case.as_deref() == Some("on") { " checked" } else { "" },
        from = value(&params.from),
        to = value(&params.to),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Validator;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use tower::ServiceExt;

    fn setup() -> (tempfile::TempDir, Arc<NoteStore>, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(NoteStore::new(
            dir.path().join("notes.json"),
            Validator::default(),
        ));
        let app = router(Arc::clone(&store), Config::default());
        (dir, store, app)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_on_empty_store() {
        let (_dir, _store, app) = setup();
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No notes yet."));
    }

    #[tokio::test]
    async fn add_redirects_to_the_new_note() {
        let (_dir, store, app) = setup();
        let response = app
            .oneshot(post("/add", "title=Budget+Plan&body=numbers"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/notes/1");
        let note = store.get(1).unwrap();
        assert_eq!(note.title, "Budget Plan");
        assert_eq!(note.body, "numbers");
    }

    #[tokio::test]
    async fn invalid_add_rerenders_the_form() {
        let (_dir, store, app) = setup();
        let response = app
            .oneshot(post("/add", "title=+++&body=kept+text"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("a title is required"));
        assert!(html.contains("kept text"));
        assert!(store.load().notes.is_empty());
    }

    #[tokio::test]
    async fn unknown_note_is_404() {
        let (_dir, _store, app) = setup();
        let response = app.oneshot(get("/notes/9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn note_page_escapes_content() {
        let (_dir, store, app) = setup();
        store.add("<script>alert(1)</script>", Some("a & b")).unwrap();

        let html = body_text(app.oneshot(get("/notes/1")).await.unwrap()).await;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[tokio::test]
    async fn edit_and_delete() {
        let (_dir, store, app) = setup();
        store.add("Old", None).unwrap();

        let response = app
            .clone()
            .oneshot(post("/notes/1/edit", "title=New&body=text"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let note = store.get(1).unwrap();
        assert_eq!(note.title, "New");
        assert!(note.updated_at.is_some());

        let response = app.oneshot(post("/notes/1/delete", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(store.get(1).is_none());
    }

    #[tokio::test]
    async fn search_highlights_matches() {
        let (_dir, store, app) = setup();
        store.add("Grocery List", Some("milk, eggs")).unwrap();
        store.add("Budget", Some("numbers")).unwrap();

        let response = app.oneshot(get("/search?q=MILK&in=body")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("1 result<"));
        assert!(html.contains("<mark>milk</mark>, eggs"));
        assert!(!html.contains("Budget"));
    }

    #[tokio::test]
    async fn search_rejects_bad_parameters() {
        let (_dir, _store, app) = setup();
        let response = app
            .clone()
            .oneshot(get("/search?q=x&from=05%2F01%2F2024"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get("/search?q=x&match=some")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn corrupt_store_refuses_writes() {
        let (dir, _store, app) = setup();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ not json").unwrap();

        let response = app.oneshot(post("/add", "title=x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn search_page_reports_a_damaged_store() {
        let (dir, _store, app) = setup();
        std::fs::write(dir.path().join("notes.json"), "{ not json").unwrap();

        let response = app.oneshot(get("/search?q=plan")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("the notes file is damaged"));
        assert!(html.contains("0 results"));
    }

    #[test]
    fn empty_keywords_are_not_a_query() {
        let params = SearchParams {
            q: Some("   ".to_string()),
            ..SearchParams::default()
        };
        assert!(parse_search(&params).unwrap().is_none());
    }
}
