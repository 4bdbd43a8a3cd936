use log::{error, info};
use serde::Serialize;

use crate::api::RecordsApi;
use crate::error::{Error, Result};
use crate::loader::Row;
use crate::record::{Field, ListPage, Record};

pub const LOAD_FAILED: &str = "Não foi possível carregar os dados.";

/// Which query the current rows answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Paginated,
    Filtered { column: Field, value: String },
}

/// Page controls for the paginated view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_count: u64,
    /// 1-based position of the first and last row shown.
    pub first_item: u64,
    pub last_item: u64,
    pub previous_page: Option<usize>,
    pub next_page: Option<usize>,
}

/// The record set currently shown on the browse page.
#[derive(Debug, Clone)]
pub struct TabularStore {
    page: usize,
    page_size: usize,
    total_count: u64,
    records: Vec<Record>,
    view: ViewMode,
    loaded: bool,
    last_error: Option<String>,
}

impl TabularStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total_count: 0,
            records: Vec::new(),
            view: ViewMode::Paginated,
            loaded: false,
            last_error: None,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn view(&self) -> &ViewMode {
        &self.view
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.records.iter().map(Record::to_row).collect()
    }

    pub fn find(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Forget the loaded rows so the next visit fetches again.
    pub fn invalidate(&mut self) {
        self.loaded = false;
        self.view = ViewMode::Paginated;
        self.page = 0;
    }

    /// Load page `index` (0-based) of `size` records
    ///
    /// Switches back to the paginated view. An index past the end falls back
    /// to the last page when the backend reports a total, and to the first
    /// page when it answers with no data at all.
    ///
    /// # Arguments
    /// * `api` - Backend to fetch from
    /// * `index` - 0-based page number, any value
    /// * `size` - Records per page, at least 1
    ///
    /// # Returns
    /// * `Result<()>` - `Ok` once the rows are replaced
    ///
    /// # Errors
    /// * `Error::Validation` for a zero `size`, before any request
    /// * The backend error when fetching fails; the old rows are kept and
    ///   [`LOAD_FAILED`] becomes the last error
    pub async fn load_page(&mut self, api: &dyn RecordsApi, index: usize, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::Validation(
                "O tamanho da página deve ser maior que zero.".to_string(),
            ));
        }

        let mut index = index;
        let mut fetched = self.fetch_page(api, index, size).await?;

        // Past the end: fall back to the last page that exists.
        if fetched.items.is_empty() && index > 0 {
            index = last_page_index(fetched.total_count, size);
            fetched = self.fetch_page(api, index, size).await?;
        }

        info!(
            "loaded page {} ({} of {} records)",
            index.saturating_add(1),
            fetched.items.len(),
            fetched.total_count
        );
        self.page = index;
        self.page_size = size;
        self.total_count = fetched.total_count;
        self.records = fetched.items;
        self.view = ViewMode::Paginated;
        self.loaded = true;
        self.last_error = None;
        Ok(())
    }

    /// Replace the rows with the records where `column` equals `value`
    ///
    /// The total becomes the number of matches; the backend sends no count here.
    ///
    /// # Arguments
    /// * `api` - Backend to query
    /// * `column` - One of the seven field names, any case
    /// * `value` - Value to match exactly, surrounding blanks trimmed
    ///
    /// # Errors
    /// * `Error::Validation` for an unknown column or a blank value; the view
    ///   is left untouched and nothing is sent
    /// * The backend error when the query fails
    pub async fn apply_filter(&mut self, api: &dyn RecordsApi, column: &str, value: &str) -> Result<()> {
        let column: Field = column.parse()?;
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::Validation(
                "Informe um valor para pesquisar.".to_string(),
            ));
        }

        let items = match api.filter(column.as_str(), value).await {
            Ok(items) => items,
            Err(e) => return Err(self.fail(e)),
        };

        info!("filter {}={} matched {} records", column, value, items.len());
        self.total_count = items.len() as u64;
        self.records = items;
        self.view = ViewMode::Filtered {
            column,
            value: value.to_string(),
        };
        self.loaded = true;
        self.last_error = None;
        Ok(())
    }

    /// Leave the filtered view and reload the page shown before it.
    pub async fn clear_filter(&mut self, api: &dyn RecordsApi) -> Result<()> {
        self.load_page(api, self.page, self.page_size).await
    }

    /// Fetch the active query again after a mutation.
    pub async fn refresh(&mut self, api: &dyn RecordsApi) -> Result<()> {
        match self.view.clone() {
            ViewMode::Paginated => self.load_page(api, self.page, self.page_size).await,
            ViewMode::Filtered { column, value } => {
                self.apply_filter(api, column.as_str(), &value).await
            }
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        if self.view != ViewMode::Paginated || !self.loaded {
            return None;
        }

        let page_count = if self.total_count == 0 {
            1
        } else {
            last_page_index(self.total_count, self.page_size) + 1
        };
        let first_item = if self.records.is_empty() {
            0
        } else {
            (self.page as u64)
                .saturating_mul(self.page_size as u64)
                .saturating_add(1)
        };
        let last_item = if self.records.is_empty() {
            0
        } else {
            first_item.saturating_add(self.records.len() as u64 - 1)
        };

        Some(Pagination {
            page: self.page,
            page_size: self.page_size,
            page_count,
            total_count: self.total_count,
            first_item,
            last_item,
            previous_page: self.page.checked_sub(1),
            next_page: self.page.checked_add(1).filter(|next| *next < page_count),
        })
    }

    async fn fetch_page(&mut self, api: &dyn RecordsApi, index: usize, size: usize) -> Result<ListPage> {
        api.list_page(index, size).await.map_err(|e| self.fail(e))
    }

    // Keep the old rows, remember the generic message, hand the error back.
    fn fail(&mut self, err: Error) -> Error {
        error!("failed to load records: {}", err);
        self.last_error = Some(LOAD_FAILED.to_string());
        err
    }
}

fn last_page_index(total_count: u64, page_size: usize) -> usize {
    ((total_count.saturating_sub(1)) / page_size as u64) as usize
}
