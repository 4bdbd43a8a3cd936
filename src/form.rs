use log::{error, info};

use crate::api::RecordsApi;
use crate::error::{Error, Result};
use crate::record::{Field, Record, RecordFields};

/// What the record form is doing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Adding(RecordFields),
    Editing(Record),
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Created(Record),
    Updated(Record),
}

impl Submitted {
    pub fn record(&self) -> &Record {
        match self {
            Submitted::Created(record) | Submitted::Updated(record) => record,
        }
    }
}

/// The add/edit form shared by both modes.
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    state: FormState,
}

impl RecordForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == FormState::Idle
    }

    /// Id of the record being edited, if any.
    pub fn editing_id(&self) -> Option<i64> {
        match &self.state {
            FormState::Editing(record) => Some(record.id),
            _ => None,
        }
    }

    /// Current field values, `None` while idle.
    pub fn values(&self) -> Option<&RecordFields> {
        match &self.state {
            FormState::Idle => None,
            FormState::Adding(fields) => Some(fields),
            FormState::Editing(record) => Some(&record.fields),
        }
    }

    /// Open an empty form for a new record.
    pub fn start_add(&mut self) {
        self.state = FormState::Adding(RecordFields::default());
    }

    /// Edit the record behind a table row.
    ///
    /// The first cell is the record id. Nothing changes unless the row is
    /// non-empty and its record is among `records`, so the form never shows
    /// values that have not arrived yet. Returns whether the form switched.
    pub fn select_row(&mut self, row: &[String], records: &[Record]) -> bool {
        let Some(id) = row.first().and_then(|cell| cell.trim().parse::<i64>().ok()) else {
            return false;
        };
        match records.iter().find(|record| record.id == id) {
            Some(record) => {
                self.edit(record.clone());
                true
            }
            None => false,
        }
    }

    pub fn edit(&mut self, record: Record) {
        self.state = FormState::Editing(record);
    }

    pub fn cancel(&mut self) {
        self.state = FormState::Idle;
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<()> {
        self.values_mut()?.set(field, value)
    }

    /// Replace every editable value at once, as a submitted HTML form does.
    pub fn fill(&mut self, fields: RecordFields) -> Result<()> {
        *self.values_mut()? = fields;
        Ok(())
    }

    /// Create or update the record, depending on the mode
    ///
    /// Dates are checked before anything is sent. `Adding` posts the fields
    /// as a new record; `Editing` sends them as the new values of the record,
    /// without its id.
    ///
    /// # Arguments
    /// * `api` - Backend that stores the record
    ///
    /// # Returns
    /// * `Result<Submitted>` - The record as the backend returned it; the form
    ///   is idle again
    ///
    /// # Errors
    /// * `Error::Validation` when idle or when a date is malformed
    /// * The backend error when the request fails
    ///
    /// On any error the mode and the typed values are kept so the user can
    /// correct and resend them.
    pub async fn submit(&mut self, api: &dyn RecordsApi) -> Result<Submitted> {
        let submitted = match &self.state {
            FormState::Idle => {
                return Err(Error::Validation(
                    "Nenhum registro em edição.".to_string(),
                ));
            }
            FormState::Adding(fields) => {
                fields.validate()?;
                let created = api.add_record(fields).await.inspect_err(|e| {
                    error!("failed to add record: {}", e);
                })?;
                info!("added record {}", created.id);
                Submitted::Created(created)
            }
            FormState::Editing(record) => {
                record.fields.validate()?;
                let updated = api
                    .update_record(record.id, &record.fields)
                    .await
                    .inspect_err(|e| error!("failed to update record {}: {}", record.id, e))?;
                info!("updated record {}", updated.id);
                Submitted::Updated(updated)
            }
        };

        self.state = FormState::Idle;
        Ok(submitted)
    }

    fn values_mut(&mut self) -> Result<&mut RecordFields> {
        match &mut self.state {
            FormState::Idle => Err(Error::Validation(
                "Nenhum registro em edição.".to_string(),
            )),
            FormState::Adding(fields) => Ok(fields),
            FormState::Editing(record) => Ok(&mut record.fields),
        }
    }
}
