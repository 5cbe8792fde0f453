use crate::domain::model::{Cell, RawSheet};
use crate::utils::error::{LabelError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

/// Load the first worksheet of `bytes`, choosing the decoder from the file name.
///
/// `.csv` goes through the csv reader, everything else through calamine which
/// sniffs xlsx/xlsm/xls/ods itself.
pub fn load_sheet(path: &str, bytes: Vec<u8>) -> Result<RawSheet> {
    let is_csv = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let sheet = if is_csv {
        load_csv(&bytes)?
    } else {
        load_workbook(path, bytes)?
    };

    tracing::debug!("Loaded {} rows from {}", sheet.rows.len(), path);
    Ok(sheet)
}

fn load_workbook(path: &str, bytes: Vec<u8>) -> Result<RawSheet> {
    let read_failure = |message: String| LabelError::SpreadsheetReadFailure {
        path: path.to_string(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| read_failure(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_failure("Workbook has no worksheets".to_string()))??;

    // calamine trims leading empty rows/columns; pad them back so header offsets
    // refer to absolute sheet rows.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = (0..start_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }

    Ok(RawSheet::new(rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

fn load_csv(bytes: &[u8]) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = record
            .iter()
            .map(|field| {
                let field = field.trim_start_matches('\u{feff}');
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(cells);
    }

    Ok(RawSheet::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_keep_banner_line() {
        let data = "\u{feff}Pedidos exportados\nNúmero de pedido,SKU del vendedor\nP1,SKU-1\nP1,\n";
        let sheet = load_sheet("orders.csv", data.as_bytes().to_vec()).unwrap();

        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[0][0], Cell::Text("Pedidos exportados".to_string()));
        assert_eq!(sheet.headers(1), vec!["Número de pedido", "SKU del vendedor"]);
        assert_eq!(sheet.rows[3][1], Cell::Empty);
    }

    #[test]
    fn garbage_workbook_is_read_failure() {
        let err = load_sheet("orders.xlsx", b"not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, LabelError::SpreadsheetReadFailure { .. }));
    }
}
