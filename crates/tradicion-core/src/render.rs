//! External renderings of a reconciled record list.

use crate::error::Result;
use crate::reconcile::{OutputFormat, ReconcileReport};
use crate::record::ReconciledRecord;

/// CSV header, in column order.
pub const CSV_COLUMNS: [&str; 4] = ["Circulo", "Folio", "Inmueble", "EP"];

/// One `<circuit>-<folio>: <name>` line per record.
pub fn render_text(records: &[ReconciledRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.identifier());
        out.push_str(": ");
        out.push_str(&record.property_name);
        out.push('\n');
    }
    out
}

/// `Circulo,Folio,Inmueble,EP` with one row per record. A missing deed is an
/// empty `EP` cell.
pub fn render_csv(records: &[ReconciledRecord]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');
    for record in records {
        let row = [
            record.circuit_code.as_str(),
            record.folio_number.as_str(),
            record.property_name.as_str(),
            record.deed_reference.as_deref().unwrap_or_default(),
        ];
        let cells: Vec<String> = row.iter().map(|cell| escape_csv(cell)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn render_json(report: &ReconcileReport) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

pub fn render(report: &ReconcileReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(&report.records)),
        OutputFormat::Csv => Ok(render_csv(&report.records)),
        OutputFormat::Json => render_json(report),
    }
}

fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(circuit: &str, folio: &str, name: &str, deed: Option<&str>) -> ReconciledRecord {
        ReconciledRecord {
            sequence_number: Some(3),
            circuit_code: circuit.into(),
            folio_number: folio.into(),
            property_name: name.into(),
            deed_reference: deed.map(str::to_string),
        }
    }

    #[test]
    fn text_lines() {
        let records = [
            record("176", "0998349", "APARTAMENTO 101", None),
            record("51N", "0998350", "APARTAMENTO 102", None),
            record("", "190172", "TORRE 9", None),
        ];
        assert_eq!(
            render_text(&records),
            "176-0998349: APARTAMENTO 101\n51N-0998350: APARTAMENTO 102\n190172: TORRE 9\n"
        );
    }

    #[test]
    fn csv_header_and_rows() {
        let records = [
            record(
                "",
                "190172",
                "TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI",
                Some("ESCRITURA 4067 DEL 16-09-2022"),
            ),
            record("176", "190173", "LOCAL 2", Some("")),
        ];
        assert_eq!(
            render_csv(&records),
            "Circulo,Folio,Inmueble,EP\n\
             ,190172,TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI,ESCRITURA 4067 DEL 16-09-2022\n\
             176,190173,LOCAL 2,\n"
        );
    }

    #[test]
    fn csv_quotes_commas_and_quotes() {
        let records = [record("176", "1", "CASA 5, LOTE \"B\"", Some(""))];
        let csv = render_csv(&records);
        assert_eq!(csv.lines().nth(1), Some("176,1,\"CASA 5, LOTE \"\"B\"\"\","));
    }

    #[test]
    fn json_omits_deed_in_plain_mode() {
        let report = ReconcileReport {
            records: vec![record("176", "1", "CASA", None)],
            ..ReconcileReport::default()
        };
        let json = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"][0]["folio_number"], "1");
        assert!(value["records"][0].get("deed_reference").is_none());
        assert_eq!(value["summary"]["records"], 0);
    }
}
