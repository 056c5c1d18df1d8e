//! CSV export of persisted cleansed rows.
//!
//! Output format matches what downstream spreadsheet consumers expect:
//! `;`-delimited, every field quoted, decimal points rewritten as commas for
//! the monetary columns, and diacritics stripped from all string fields.

use crate::models::CleansedRow;

/// Column order of the exported file.
const COLUMNS: [&str; 29] = [
    "numero_beneficio",
    "numero_documento",
    "nome",
    "estado",
    "pensao",
    "data_nascimento",
    "tipo_bloqueio",
    "data_concessao",
    "tipo_credito",
    "limite_cartao_beneficio",
    "saldo_cartao_beneficio",
    "status_beneficio",
    "data_fim_beneficio",
    "limite_cartao_consignado",
    "saldo_cartao_consignado",
    "saldo_credito_consignado",
    "saldo_total_maximo",
    "saldo_total_utilizado",
    "saldo_total_disponivel",
    "data_consulta",
    "data_retorno_consulta",
    "tempo_retorno_consulta",
    "nome_representante_legal",
    "banco_desembolso",
    "agencia_desembolso",
    "numero_conta_desembolso",
    "digito_conta_desembolso",
    "numero_portabilidades",
    "nome_arquivo",
];

/// Serialize rows as the `;`-delimited export file, header included.
pub fn render_csv(rows: &[CleansedRow]) -> String {
    let mut out = String::new();
    write_line(&mut out, COLUMNS.iter().map(|c| c.to_string()));
    for row in rows {
        write_line(&mut out, row_values(row).into_iter());
    }
    out
}

fn write_line(out: &mut String, values: impl Iterator<Item = String>) {
    let mut first = true;
    for value in values {
        if !first {
            out.push(';');
        }
        first = false;
        out.push('"');
        // Embedded quotes are doubled per the usual CSV convention.
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}

fn row_values(row: &CleansedRow) -> Vec<String> {
    vec![
        text(&row.numero_beneficio),
        text(&row.numero_documento),
        text(&row.nome),
        text(&row.estado),
        text(&row.pensao),
        text(&row.data_nascimento),
        text(&row.tipo_bloqueio),
        text(&row.data_concessao),
        text(&row.tipo_credito),
        money(row.limite_cartao_beneficio),
        money(row.saldo_cartao_beneficio),
        text(&row.status_beneficio),
        text(&row.data_fim_beneficio),
        money(row.limite_cartao_consignado),
        money(row.saldo_cartao_consignado),
        money(row.saldo_credito_consignado),
        money(row.saldo_total_maximo),
        money(row.saldo_total_utilizado),
        money(row.saldo_total_disponivel),
        text(&row.data_consulta),
        text(&row.data_retorno_consulta),
        text(&row.tempo_retorno_consulta),
        text(&row.nome_representante_legal),
        text(&row.banco_desembolso),
        text(&row.agencia_desembolso),
        text(&row.numero_conta_desembolso),
        text(&row.digito_conta_desembolso),
        row.numero_portabilidades
            .map(|n| n.to_string())
            .unwrap_or_default(),
        strip_diacritics(&row.nome_arquivo),
    ]
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(strip_diacritics).unwrap_or_default()
}

/// Monetary columns use a decimal comma in the export.
fn money(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string().replace('.', ","))
        .unwrap_or_default()
}

/// Fold the accented characters of Portuguese text onto plain ASCII.
pub fn strip_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> CleansedRow {
        CleansedRow {
            numero_beneficio: Some("1234567890".to_string()),
            numero_documento: Some("12345678901".to_string()),
            nome: Some("José Conceição".to_string()),
            pensao: Some("NÃO".to_string()),
            tipo_credito: Some("Cartão Magnético".to_string()),
            saldo_total_disponivel: Some(1523.44),
            numero_portabilidades: Some(2),
            nome_arquivo: "lote_01".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_header_order_and_quoting() {
        let csv = render_csv(&[]);
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("\"numero_beneficio\";\"numero_documento\""));
        assert!(header.ends_with("\"numero_portabilidades\";\"nome_arquivo\""));
        assert_eq!(header.split(';').count(), 29);
    }

    #[test]
    fn test_monetary_columns_use_decimal_comma() {
        let csv = render_csv(&[sample_row()]);
        assert!(csv.contains("\"1523,44\""));
    }

    #[test]
    fn test_diacritics_are_stripped_from_strings() {
        let csv = render_csv(&[sample_row()]);
        assert!(csv.contains("\"Jose Conceicao\""));
        assert!(csv.contains("\"NAO\""));
        assert!(csv.contains("\"Cartao Magnetico\""));
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let mut row = sample_row();
        row.nome = Some("Maria \"Mazinha\" Souza".to_string());
        let csv = render_csv(&[row]);
        assert!(csv.contains("\"Maria \"\"Mazinha\"\" Souza\""));
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("açúcar à vontade"), "acucar a vontade");
        assert_eq!(strip_diacritics("plain ascii"), "plain ascii");
    }
}
