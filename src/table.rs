use serde::Serialize;

use crate::loader::Row;
use crate::record::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// A freshly parsed file: its first row holds the headers.
    Preview,
    /// Records from the backend, with edit and delete controls.
    Browse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    pub actions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    /// First cell, used to address the row's record in edit and delete.
    pub id: Option<String>,
}

/// Lay out `rows` for display. `None` when there is nothing to show.
pub fn render_table(rows: &[Row], mode: TableMode) -> Option<TableView> {
    match mode {
        TableMode::Preview => {
            let (headers, data) = rows.split_first()?;
            Some(TableView {
                headers: headers.clone(),
                rows: data
                    .iter()
                    .map(|cells| TableRow {
                        cells: cells.clone(),
                        id: None,
                    })
                    .collect(),
                actions: false,
            })
        }
        TableMode::Browse => {
            if rows.is_empty() {
                return None;
            }
            Some(TableView {
                headers: Field::ALL.iter().map(|f| f.as_str().to_string()).collect(),
                rows: rows
                    .iter()
                    .map(|cells| TableRow {
                        cells: cells.clone(),
                        id: cells.first().cloned(),
                    })
                    .collect(),
                actions: true,
            })
        }
    }
}
