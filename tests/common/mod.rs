#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use csv_uploader::api::RecordsApi;
use csv_uploader::error::{Error, Result};
use csv_uploader::loader::{TrailingLines, parse_csv_bytes};
use csv_uploader::record::{Field, ListPage, Record, RecordFields};

pub fn person(nome: &str) -> RecordFields {
    RecordFields {
        nome: nome.to_string(),
        data_nascimento: "1990/05/17".to_string(),
        nacionalidade: "Brasileira".to_string(),
        genero: "F".to_string(),
        data_criacao: "2024/01/10".to_string(),
        data_atualizacao: "10/01/2024".to_string(),
    }
}

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    next_id: i64,
    failing: bool,
    uploads: Vec<(String, Vec<u8>)>,
    list_calls: usize,
}

/// In-memory backend double.
#[derive(Default)]
pub struct FakeApi {
    inner: Mutex<Inner>,
}

impl FakeApi {
    /// Records `Pessoa 1` .. `Pessoa n` with ids 1..=n.
    pub fn with_records(n: i64) -> Self {
        let records = (1..=n)
            .map(|id| Record {
                id,
                fields: person(&format!("Pessoa {}", id)),
            })
            .collect();
        Self {
            inner: Mutex::new(Inner {
                records,
                next_id: n + 1,
                ..Inner::default()
            }),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    pub fn records(&self) -> Vec<Record> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn record(&self, id: i64) -> Option<Record> {
        self.records().into_iter().find(|r| r.id == id)
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.lock().unwrap().uploads.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        let inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(Error::Status {
                status: 500,
                body: "backend down".to_string(),
            });
        }
        Ok(inner)
    }
}

fn not_found(id: i64) -> Error {
    Error::Status {
        status: 404,
        body: format!("item {} not found", id),
    }
}

#[async_trait]
impl RecordsApi for FakeApi {
    async fn upload_csv(&self, file_name: &str, contents: Vec<u8>) -> Result<()> {
        let mut inner = self.guard()?;
        let rows = parse_csv_bytes(&contents, TrailingLines::Drop)?;
        for row in rows.iter().skip(1).filter(|row| row.len() >= 6) {
            let id = inner.next_id.max(1);
            inner.next_id = id + 1;
            inner.records.push(Record {
                id,
                fields: RecordFields {
                    nome: row[0].clone(),
                    data_nascimento: row[1].clone(),
                    genero: row[2].clone(),
                    nacionalidade: row[3].clone(),
                    data_criacao: row[4].clone(),
                    data_atualizacao: row[5].clone(),
                },
            });
        }
        inner.uploads.push((file_name.to_string(), contents));
        Ok(())
    }

    async fn list_page(&self, page: usize, page_size: usize) -> Result<ListPage> {
        let mut inner = self.guard()?;
        inner.list_calls += 1;
        Ok(ListPage {
            total_count: inner.records.len() as u64,
            items: inner
                .records
                .iter()
                .skip(page.saturating_mul(page_size))
                .take(page_size)
                .cloned()
                .collect(),
        })
    }

    async fn filter(&self, column: &str, value: &str) -> Result<Vec<Record>> {
        let inner = self.guard()?;
        let field: Field = column.parse()?;
        Ok(inner
            .records
            .iter()
            .filter(|record| record.get(field) == value)
            .cloned()
            .collect())
    }

    async fn add_record(&self, fields: &RecordFields) -> Result<Record> {
        let mut inner = self.guard()?;
        let id = inner.next_id.max(1);
        inner.next_id = id + 1;
        let record = Record {
            id,
            fields: fields.clone(),
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, id: i64, fields: &RecordFields) -> Result<Record> {
        let mut inner = self.guard()?;
        let record = inner
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| not_found(id))?;
        record.fields = fields.clone();
        Ok(record.clone())
    }

    async fn delete_record(&self, id: i64) -> Result<()> {
        let mut inner = self.guard()?;
        let before = inner.records.len();
        inner.records.retain(|record| record.id != id);
        if inner.records.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn download_csv(&self) -> Result<Vec<u8>> {
        let inner = self.guard()?;
        let mut csv = String::from(
            "Nome,Data de Nascimento,Gênero,Nacionalidade,Data de Criacao,Data de Atualizacao\r\n",
        );
        for record in &inner.records {
            let f = &record.fields;
            csv.push_str(&format!(
                "{},{},{},{},{},{}\r\n",
                f.nome, f.data_nascimento, f.genero, f.nacionalidade, f.data_criacao, f.data_atualizacao
            ));
        }
        Ok(csv.into_bytes())
    }
}
