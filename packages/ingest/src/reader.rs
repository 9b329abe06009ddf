//! CSV text to dataset rows.
//!
//! Header names are trimmed and lower-cased. Cells are trimmed and typed
//! dynamically: empty cells become null, cells that parse as a finite number
//! become numbers, everything else stays text.

use std::path::Path;

use pattern_map_analytics_models::{Row, Value};

use crate::IngestError;

/// Parses CSV text with a header row into rows keyed by header name.
///
/// Blank lines are skipped. Rows shorter than the header are padded with
/// nulls; extra cells are ignored. Columns with an empty header are dropped.
///
/// # Errors
///
/// * [`IngestError::Csv`] if the text is not valid CSV
/// * [`IngestError::Parse`] if there is no header row
pub fn parse_csv(text: &str) -> Result<Vec<Row>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(str::to_lowercase)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::Parse(
            "CSV file contains no header row".to_owned(),
        ));
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(i, header)| (header.clone(), typed_value(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Reads and parses a CSV file.
///
/// # Errors
///
/// * [`IngestError::Io`] if the file cannot be read
/// * any error from [`parse_csv`]
pub fn read_csv_file(path: &Path) -> Result<Vec<Row>, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let rows = parse_csv(&text)?;
    log::info!("Parsed {} records from {}", rows.len(), path.display());
    Ok(rows)
}

/// Types a single trimmed cell.
#[must_use]
pub fn typed_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match cell.parse::<f64>() {
        Ok(number) if number.is_finite() => Value::Number(number),
        _ => Value::Text(cell.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use pattern_map_analytics_models::cell;

    use super::*;

    #[test]
    fn headers_are_normalized_and_cells_typed() {
        let rows = parse_csv(" FIPS , County,State,Income\n01001, Autauga ,Alabama,\n").unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(cell(row, "fips"), &Value::Number(1001.0));
        assert_eq!(cell(row, "county"), &Value::from("Autauga"));
        assert_eq!(cell(row, "state"), &Value::from("Alabama"));
        assert_eq!(cell(row, "income"), &Value::Null);
    }

    #[test]
    fn quoted_descriptions_survive() {
        let text = "keys,description,target,mean\n\
                    income,\"{'ID': 3, 'constraints': {'income': {'lb': -inf, 'ub': 50000}}}\",poverty,12.5\n";
        let rows = parse_csv(text).unwrap();

        assert_eq!(
            cell(&rows[0], "description"),
            &Value::from("{'ID': 3, 'constraints': {'income': {'lb': -inf, 'ub': 50000}}}")
        );
        assert_eq!(cell(&rows[0], "mean"), &Value::Number(12.5));
    }

    #[test]
    fn blank_lines_are_skipped_and_short_rows_padded() {
        let rows = parse_csv("a,b,c\n1,2,3\n\n4,5\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(cell(&rows[1], "a"), &Value::Number(4.0));
        assert_eq!(cell(&rows[1], "c"), &Value::Null);
    }

    #[test]
    fn non_finite_words_stay_text() {
        assert_eq!(typed_value("inf"), Value::from("inf"));
        assert_eq!(typed_value("NaN"), Value::from("NaN"));
        assert_eq!(typed_value("1e3"), Value::Number(1000.0));
        assert_eq!(typed_value("-2.5"), Value::Number(-2.5));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(parse_csv(""), Err(IngestError::Parse(_))));
    }

    #[test]
    fn reads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "fips,county,state\n1,A,S\n2,B,S\n").unwrap();

        let rows = read_csv_file(&path).unwrap();
        assert_eq!(rows.len(), 2);

        let missing = read_csv_file(&dir.path().join("missing.csv"));
        assert!(matches!(missing, Err(IngestError::Io(_))));
    }
}
