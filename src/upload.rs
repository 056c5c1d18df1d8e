//! Upload parsing: delimited text into ordered records, plus batch label
//! derivation from the uploaded file name.

use crate::error::{BatchError, Result};
use crate::models::BatchRecord;

const DELIMITER: char = ';';

/// Parse an uploaded `;`-separated text blob into records.
///
/// The first row must be a two-column header naming `cpf` and `nb`
/// (case-insensitive, either order); the header decides which column feeds
/// `identity` and which feeds `benefit`. Blank lines are skipped. Missing
/// cells become empty strings and fail structural validation downstream.
pub fn parse_upload(text: &str) -> Result<Vec<BatchRecord>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(BatchError::Upload(format!(
            "expected a header row and at least one data row, got {} row(s)",
            lines.len()
        )));
    }

    let (cpf_index, nb_index) = parse_header(lines[0])?;

    let records = lines[1..]
        .iter()
        .map(|line| {
            let columns: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
            let cell = |i: usize| columns.get(i).copied().unwrap_or_default();
            BatchRecord::new(cell(cpf_index), cell(nb_index))
        })
        .collect();

    Ok(records)
}

/// Resolve the column positions of `cpf` and `nb` from the header row.
fn parse_header(header: &str) -> Result<(usize, usize)> {
    let columns: Vec<String> = header
        .split(DELIMITER)
        .map(|c| c.trim().to_lowercase())
        .collect();

    if columns.len() != 2 {
        return Err(BatchError::Upload(format!(
            "header must have exactly two columns, got {}",
            columns.len()
        )));
    }

    let cpf = columns.iter().position(|c| c == "cpf");
    let nb = columns.iter().position(|c| c == "nb");

    match (cpf, nb) {
        (Some(cpf_index), Some(nb_index)) => Ok((cpf_index, nb_index)),
        _ => Err(BatchError::Upload(format!(
            "header must name the cpf and nb columns, got \"{header}\""
        ))),
    }
}

/// Derive a batch label from an uploaded file name: extension stripped,
/// non-alphanumeric characters replaced with `_`, lowercased.
pub fn format_label(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    };
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_cpf_first() {
        let records = parse_upload("cpf;nb\n12345678901;1234567890\n").unwrap();
        assert_eq!(records, vec![BatchRecord::new("12345678901", "1234567890")]);
    }

    #[test]
    fn test_parse_upload_reorders_nb_first_header() {
        let records = parse_upload("nb;cpf\n1234567890;12345678901\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "12345678901");
        assert_eq!(records[0].benefit, "1234567890");
    }

    #[test]
    fn test_header_is_case_insensitive() {
        let records = parse_upload("CPF;NB\n12345678901;1234567890").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_rejects_missing_data_rows() {
        assert!(matches!(
            parse_upload("cpf;nb\n"),
            Err(BatchError::Upload(_))
        ));
        assert!(matches!(parse_upload(""), Err(BatchError::Upload(_))));
    }

    #[test]
    fn test_rejects_unknown_header() {
        assert!(matches!(
            parse_upload("cpf;beneficio\n12345678901;1234567890"),
            Err(BatchError::Upload(_))
        ));
        assert!(matches!(
            parse_upload("cpf;nb;extra\n1;2;3"),
            Err(BatchError::Upload(_))
        ));
    }

    #[test]
    fn test_blank_lines_and_padding_are_ignored() {
        let records = parse_upload("cpf;nb\n\n 12345678901 ; 1234567890 \n\n").unwrap();
        assert_eq!(records, vec![BatchRecord::new("12345678901", "1234567890")]);
    }

    #[test]
    fn test_short_data_rows_yield_empty_cells() {
        let records = parse_upload("cpf;nb\n12345678901").unwrap();
        assert_eq!(records[0].benefit, "");
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("Lote Março-2025.csv"), "lote_mar_o_2025");
        assert_eq!(format_label("clientes.txt"), "clientes");
        assert_eq!(format_label("no_extension"), "no_extension");
        assert_eq!(format_label(".hidden"), "_hidden");
    }
}
