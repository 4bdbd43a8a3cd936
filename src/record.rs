use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::loader::Row;

lazy_static! {
    static ref DAY_FIRST_REGEX: Regex = Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap();
    static ref YEAR_FIRST_REGEX: Regex = Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").unwrap();
}

/// The named columns of a record, in the order the backend sends them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Nome,
    DataNascimento,
    Nacionalidade,
    Genero,
    DataCriacao,
    DataAtualizacao,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Nome,
        Field::DataNascimento,
        Field::Nacionalidade,
        Field::Genero,
        Field::DataCriacao,
        Field::DataAtualizacao,
    ];

    /// Fields a user can type into; `id` belongs to the backend.
    pub const EDITABLE: [Field; 6] = [
        Field::Nome,
        Field::DataNascimento,
        Field::Nacionalidade,
        Field::Genero,
        Field::DataCriacao,
        Field::DataAtualizacao,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Nome => "nome",
            Field::DataNascimento => "data_nascimento",
            Field::Nacionalidade => "nacionalidade",
            Field::Genero => "genero",
            Field::DataCriacao => "data_criacao",
            Field::DataAtualizacao => "data_atualizacao",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Id => "Id",
            Field::Nome => "Nome",
            Field::DataNascimento => "Data de Nascimento",
            Field::Nacionalidade => "Nacionalidade",
            Field::Genero => "Gênero",
            Field::DataCriacao => "Data de Cadastro",
            Field::DataAtualizacao => "Data de Atualização",
        }
    }

    pub fn is_date(self) -> bool {
        matches!(
            self,
            Field::DataNascimento | Field::DataCriacao | Field::DataAtualizacao
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Validation(format!("Coluna desconhecida: {}", name)))
    }
}

/// A record without its id: the body of add and update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub nome: String,
    pub data_nascimento: String,
    pub nacionalidade: String,
    pub genero: String,
    pub data_criacao: String,
    pub data_atualizacao: String,
}

impl RecordFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Id => return None,
            Field::Nome => &self.nome,
            Field::DataNascimento => &self.data_nascimento,
            Field::Nacionalidade => &self.nacionalidade,
            Field::Genero => &self.genero,
            Field::DataCriacao => &self.data_criacao,
            Field::DataAtualizacao => &self.data_atualizacao,
        };
        Some(value.as_str())
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<()> {
        let slot = match field {
            Field::Id => {
                return Err(Error::Validation(
                    "O campo id é atribuído pelo servidor.".to_string(),
                ));
            }
            Field::Nome => &mut self.nome,
            Field::DataNascimento => &mut self.data_nascimento,
            Field::Nacionalidade => &mut self.nacionalidade,
            Field::Genero => &mut self.genero,
            Field::DataCriacao => &mut self.data_criacao,
            Field::DataAtualizacao => &mut self.data_atualizacao,
        };
        *slot = value.into();
        Ok(())
    }

    /// Check the date fields against the formats the backend accepts.
    pub fn validate(&self) -> Result<()> {
        for field in Field::EDITABLE.into_iter().filter(|f| f.is_date()) {
            let value = self.get(field).unwrap_or_default().trim();
            if !is_valid_date(value) {
                return Err(Error::Validation(format!(
                    "Formato inválido em {}: \"{}\" (use aaaa/mm/dd ou dd/mm/aaaa).",
                    field.label(),
                    value
                )));
            }
        }
        Ok(())
    }
}

/// A stored record as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    pub fn get(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.to_string(),
            other => self.fields.get(other).unwrap_or_default().to_string(),
        }
    }

    /// The record as a table row, one cell per field in `Field::ALL` order.
    pub fn to_row(&self) -> Row {
        Field::ALL.into_iter().map(|field| self.get(field)).collect()
    }
}

/// One page of the paginated listing, already split from the count the
/// backend prepends to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub total_count: u64,
    pub items: Vec<Record>,
}

impl ListPage {
    /// Decode the body of `GET /all`.
    ///
    /// The documented shape is `[count, record, record, ...]`. The reference
    /// backend serializes its `(records, count)` tuple as `[[record, ...], count]`,
    /// so that shape is accepted as well. `null` and `[]` mean no data.
    pub fn from_body(body: Option<Vec<Value>>) -> Result<Self> {
        let mut values = match body {
            Some(values) if !values.is_empty() => values,
            _ => return Ok(ListPage::default()),
        };

        if values.len() == 2 && values[0].is_array() && !values[1].is_object() {
            let total_count = parse_count(&values[1])?;
            let items = serde_json::from_value(values.swap_remove(0))
                .map_err(|e| Error::Decode(e.to_string()))?;
            return Ok(ListPage { total_count, items });
        }

        let total_count = parse_count(&values[0])?;
        let items = values
            .into_iter()
            .skip(1)
            .map(|value| serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string())))
            .collect::<Result<Vec<Record>>>()?;

        Ok(ListPage { total_count, items })
    }
}

fn parse_count(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Decode(format!("expected a total count, got {}", value)))
}

/// Whether a date reads as `aaaa/mm/dd` or `dd/mm/aaaa`.
pub fn is_valid_date(value: &str) -> bool {
    if DAY_FIRST_REGEX.is_match(value) {
        NaiveDate::parse_from_str(value, "%d/%m/%Y").is_ok()
    } else if YEAR_FIRST_REGEX.is_match(value) {
        NaiveDate::parse_from_str(value, "%Y/%m/%d").is_ok()
    } else {
        false
    }
}
