//! Drives the reqwest client against a small axum stand-in for the backend.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use csv_uploader::api::{HttpRecordsApi, RecordsApi};
use csv_uploader::downloader::CsvDownload;
use csv_uploader::error::Error;
use csv_uploader::loader::{TrailingLines, parse_csv, parse_csv_bytes};
use csv_uploader::record::{Field, Record, RecordFields};
use csv_uploader::store::TabularStore;

const EXPORT_HEADER: &str =
    "Nome,Data de Nascimento,Gênero,Nacionalidade,Data de Criacao,Data de Atualizacao";

#[derive(Default)]
struct Db {
    records: Vec<Record>,
    next_id: i64,
}

type Shared = Arc<Mutex<Db>>;

impl Db {
    fn insert(&mut self, fields: RecordFields) -> Record {
        self.next_id += 1;
        let record = Record {
            id: self.next_id,
            fields,
        };
        self.records.push(record.clone());
        record
    }
}

async fn upload(State(db): State<Shared>, mut multipart: Multipart) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.unwrap();
        let rows = parse_csv_bytes(&bytes, TrailingLines::Drop).unwrap();
        let mut db = db.lock().unwrap();
        for row in rows.iter().skip(1) {
            db.insert(RecordFields {
                nome: row[0].clone(),
                data_nascimento: row[1].clone(),
                genero: row[2].clone(),
                nacionalidade: row[3].clone(),
                data_criacao: row[4].clone(),
                data_atualizacao: row[5].clone(),
            });
        }
        return Json(json!({"message": "CSV file uploaded successfully"})).into_response();
    }
    StatusCode::UNPROCESSABLE_ENTITY.into_response()
}

async fn all(State(db): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let header = |name: &str, default: usize| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default)
    };
    let page = header("page", 1);
    let page_size = header("page_size", 10);

    let db = db.lock().unwrap();
    let items: Vec<Value> = db
        .records
        .iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .map(|r| serde_json::to_value(r).unwrap())
        .collect();
    if items.is_empty() {
        return Json(Value::Null);
    }
    let mut body = vec![json!(db.records.len())];
    body.extend(items);
    Json(Value::Array(body))
}

async fn filter(
    State(db): State<Shared>,
    Path((field, value)): Path<(String, String)>,
) -> Json<Value> {
    let field: Field = field.parse().unwrap();
    let db = db.lock().unwrap();
    let matches: Vec<&Record> = db.records.iter().filter(|r| r.get(field) == value).collect();
    if matches.is_empty() {
        return Json(Value::Null);
    }
    Json(serde_json::to_value(matches).unwrap())
}

async fn add(State(db): State<Shared>, Json(fields): Json<RecordFields>) -> Json<Record> {
    Json(db.lock().unwrap().insert(fields))
}

async fn update(
    State(db): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if body.get("id").is_some() {
        return (StatusCode::BAD_REQUEST, "id must not be sent").into_response();
    }
    let fields: RecordFields = serde_json::from_value(body).unwrap();
    let mut db = db.lock().unwrap();
    match db.records.iter_mut().find(|r| r.id == id) {
        Some(record) => {
            record.fields = fields;
            Json(record.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn remove(State(db): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    db.lock().unwrap().records.retain(|r| r.id != id);
    StatusCode::NO_CONTENT
}

async fn export(State(db): State<Shared>) -> String {
    let db = db.lock().unwrap();
    let mut out = format!("{}\r\n", EXPORT_HEADER);
    for r in &db.records {
        let f = &r.fields;
        out.push_str(&format!(
            "{},{},{},{},{},{}\r\n",
            f.nome, f.data_nascimento, f.genero, f.nacionalidade, f.data_criacao, f.data_atualizacao
        ));
    }
    out
}

async fn spawn_backend() -> HttpRecordsApi {
    let db: Shared = Arc::new(Mutex::new(Db::default()));
    let api = Router::new()
        .route("/upload-csv-file", post(upload))
        .route("/all", get(all))
        .route("/filter/field/:field/value/:value", get(filter))
        .route("/add-item", post(add))
        .route("/update/id/:id", put(update))
        .route("/delete/id/:id", delete(remove))
        .route("/csv-file", get(export))
        .with_state(db);
    let app = Router::new().nest("/csv-uploader/api", api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpRecordsApi::new(format!("http://{}/csv-uploader/api/", addr), None).unwrap()
}

fn upload_text() -> String {
    format!(
        "{}\n\
         Ana,1990/05/17,F,Brasileira,2024/01/10,2024/01/10\n\
         Bruno,02/03/1985,M,Portuguesa,2024/01/11,2024/01/12\n\
         Carla,1979/12/01,F,Angolana,2024/02/01,2024/02/02\n",
        EXPORT_HEADER
    )
}

#[tokio::test]
async fn upload_then_download_round_trips_the_rows() {
    let api = spawn_backend().await;
    let text = upload_text();

    api.upload_csv("pessoas.csv", text.clone().into_bytes()).await.unwrap();
    let download = CsvDownload::new(api.download_csv().await.unwrap());

    let uploaded = parse_csv(&text, TrailingLines::Drop);
    let downloaded = download.rows(TrailingLines::Drop).unwrap();
    assert_eq!(downloaded, uploaded);
}

#[tokio::test]
async fn list_sends_one_based_page_headers_and_splits_the_count() {
    let api = spawn_backend().await;
    api.upload_csv("pessoas.csv", upload_text().into_bytes()).await.unwrap();

    let first = api.list_page(0, 2).await.unwrap();
    assert_eq!(first.total_count, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].fields.nome, "Ana");

    let second = api.list_page(1, 2).await.unwrap();
    assert_eq!(second.total_count, 3);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].fields.nome, "Carla");

    let past_end = api.list_page(5, 2).await.unwrap();
    assert_eq!(past_end.total_count, 0);
    assert!(past_end.items.is_empty());
}

#[tokio::test]
async fn filter_encodes_path_segments_and_treats_null_as_empty() {
    let api = spawn_backend().await;
    let mut fields = RecordFields {
        nome: "Ana Maria/Souza".to_string(),
        ..RecordFields::default()
    };
    fields.genero = "F".to_string();
    api.add_record(&fields).await.unwrap();

    let found = api.filter("nome", "Ana Maria/Souza").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fields.genero, "F");

    assert!(api.filter("nome", "Ninguém").await.unwrap().is_empty());
}

#[tokio::test]
async fn add_update_delete_round_trip() {
    let api = spawn_backend().await;

    let created = api
        .add_record(&RecordFields {
            nome: "Davi".to_string(),
            data_nascimento: "2000/01/01".to_string(),
            ..RecordFields::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 1);

    let mut changed = created.fields.clone();
    changed.nacionalidade = "Chilena".to_string();
    let updated = api.update_record(created.id, &changed).await.unwrap();
    assert_eq!(updated.fields.nacionalidade, "Chilena");

    api.delete_record(created.id).await.unwrap();
    let page = api.list_page(0, 10).await.unwrap();
    assert!(page.items.iter().all(|r| r.id != created.id));

    let err = api.update_record(42, &changed).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpRecordsApi::new(format!("http://{}/csv-uploader/api", addr), None).unwrap();
    let err = api.list_page(0, 10).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn huge_page_index_falls_back_to_the_first_page() {
    let api = spawn_backend().await;
    api.upload_csv("pessoas.csv", upload_text().into_bytes()).await.unwrap();

    // This backend answers null past the end, so no total is known.
    let page = api.list_page(usize::MAX, 2).await.unwrap();
    assert!(page.items.is_empty());

    let mut store = TabularStore::new(2);
    store.load_page(&api, usize::MAX, 2).await.unwrap();
    assert_eq!(store.page(), 0);
    assert_eq!(store.records()[0].fields.nome, "Ana");
}
