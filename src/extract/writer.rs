use serde::Serialize;

use super::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "CSV" => Some(Self::Csv),
            "TSV" => Some(Self::Tsv),
            "JSON" => Some(Self::Json),
            _ => None,
        }
    }
}

/// One extracted table, tagged with the 1-based page it came from.
#[derive(Debug, Serialize)]
pub struct PageTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

pub fn write(format: OutputFormat, tables: &[PageTable]) -> Result<String, ExtractError> {
    match format {
        OutputFormat::Csv => delimited(tables, b','),
        OutputFormat::Tsv => delimited(tables, b'\t'),
        OutputFormat::Json => {
            serde_json::to_string_pretty(tables).map_err(|e| ExtractError::Output(e.to_string()))
        }
    }
}

fn delimited(tables: &[PageTable], delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(vec![]);
    for table in tables {
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|e| ExtractError::Output(e.to_string()))?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExtractError::Output(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExtractError::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PageTable> {
        vec![PageTable {
            page: 1,
            rows: vec![
                vec!["Payee".to_string(), "Amount".to_string()],
                vec!["Coffee, beans".to_string(), "8.00".to_string()],
            ],
        }]
    }

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!(OutputFormat::parse("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("Json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("TSV"), Some(OutputFormat::Tsv));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn csv_quotes_cells_containing_the_delimiter() {
        let out = write(OutputFormat::Csv, &sample()).unwrap();
        assert!(out.starts_with("Payee,Amount\n"));
        assert!(out.contains("\"Coffee, beans\",8.00"));
    }

    #[test]
    fn tsv_uses_tab_delimiters() {
        let out = write(OutputFormat::Tsv, &sample()).unwrap();
        assert!(out.contains("Payee\tAmount"));
        assert!(out.contains("Coffee, beans\t8.00"));
    }

    #[test]
    fn json_carries_page_numbers() {
        let out = write(OutputFormat::Json, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["page"], 1);
        assert_eq!(value[0]["rows"][0][0], "Payee");
    }

    #[test]
    fn empty_input_renders_empty_output() {
        assert_eq!(write(OutputFormat::Csv, &[]).unwrap(), "");
        assert_eq!(write(OutputFormat::Json, &[]).unwrap(), "[]");
    }
}
