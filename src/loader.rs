use std::path::Path;

use crate::error::{Error, Result};

/// One line of a CSV file, split into cells.
pub type Row = Vec<String>;

const DELIMITER: char = ',';
const BOM: char = '\u{feff}';

/// What to do with blank lines at the very end of a file.
///
/// Files saved by most editors end with a newline, which would otherwise show
/// up as an extra row holding a single empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TrailingLines {
    /// Every line becomes a row, including trailing blank ones.
    Keep,
    /// Blank lines at the end of the text are discarded.
    #[default]
    Drop,
}

/// Parse CSV text into rows of cells
///
/// Splits on line breaks (`\n` or `\r\n`), then on commas. Quoting is not
/// supported: a comma inside a value shifts the remaining columns.
///
/// # Arguments
/// * `text` - Raw file content
/// * `trailing` - Policy for blank lines at the end of the text
///
/// # Returns
/// * `Vec<Row>` - One row per line, in file order
///
/// # Examples
/// ```
/// use csv_uploader::loader::{parse_csv, TrailingLines};
///
/// let rows = parse_csv("nome,genero\nAna,F\n", TrailingLines::Drop);
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1], vec!["Ana".to_string(), "F".to_string()]);
///
/// let rows = parse_csv("nome,genero\nAna,F\n", TrailingLines::Keep);
/// assert_eq!(rows.len(), 3);
/// assert_eq!(rows[2], vec![String::new()]);
/// ```
pub fn parse_csv(text: &str, trailing: TrailingLines) -> Vec<Row> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if trailing == TrailingLines::Drop {
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
    }

    lines.into_iter().map(parse_csv_row).collect()
}

/// Decode uploaded bytes and parse them
///
/// # Errors
/// * `Error::Parse` if the bytes are not valid UTF-8
pub fn parse_csv_bytes(bytes: &[u8], trailing: TrailingLines) -> Result<Vec<Row>> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        Error::Parse(format!(
            "O arquivo não está em UTF-8 (byte inválido na posição {}).",
            e.valid_up_to()
        ))
    })?;
    Ok(parse_csv(text, trailing))
}

/// Read and parse a CSV file from disk
///
/// # Errors
/// * `Error::Io` if the file cannot be read
/// * `Error::Parse` if its content is not valid UTF-8
pub fn read_csv_file(path: impl AsRef<Path>, trailing: TrailingLines) -> Result<Vec<Row>> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_csv_bytes(&bytes, trailing)
}

// Split one line on the delimiter
fn parse_csv_row(line: &str) -> Row {
    line.split(DELIMITER).map(str::to_string).collect()
}
