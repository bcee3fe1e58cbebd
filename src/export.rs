use askama::Template;
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::render::{HEADERS, ListingRow};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// HTML table that spreadsheet programs open as a workbook.
    #[default]
    Xls,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "xls",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "application/vnd.ms-excel",
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// A rendered export, ready to be downloaded or written to disk.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub body: Vec<u8>,
}

impl ExportFile {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[derive(Template)]
#[template(path = "export.html")]
struct SpreadsheetTemplate<'a> {
    headers: &'a [&'static str],
    rows: &'a [ListingRow],
}

/// Builds the download name. Blank input falls back to the default stem;
/// otherwise every character outside `[A-Za-z0-9]` becomes `_` and the
/// result is lowercased.
pub fn sanitize_filename(input: Option<&str>, default_stem: &str, format: ExportFormat) -> String {
    let trimmed = input.map(str::trim).unwrap_or_default();
    let stem = if trimmed.is_empty() {
        default_stem.to_string()
    } else {
        trimmed
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .to_lowercase()
    };
    format!("{}.{}", stem, format.extension())
}

pub fn render_spreadsheet(rows: &[ListingRow]) -> Result<String> {
    let template = SpreadsheetTemplate {
        headers: &HEADERS,
        rows,
    };
    Ok(template.render()?)
}

/// Visible cell text only; link cells contribute their label.
pub fn render_csv(rows: &[ListingRow]) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    wtr.write_record(HEADERS)?;
    for row in rows {
        wtr.write_record(row.cells.iter().map(|cell| cell.text.as_str()))?;
    }

    wtr.into_inner()
        .map_err(|e| AppError::Export(e.error().to_string()))
}

pub fn build_export(
    rows: &[ListingRow],
    filename: Option<&str>,
    default_stem: &str,
    format: ExportFormat,
) -> Result<ExportFile> {
    let body = match format {
        ExportFormat::Xls => render_spreadsheet(rows)?.into_bytes(),
        ExportFormat::Csv => render_csv(rows)?,
    };
    let filename = sanitize_filename(filename, default_stem, format);
    debug!("Rendered {} rows into {} ({} bytes)", rows.len(), filename, body.len());

    Ok(ExportFile {
        filename,
        format,
        body,
    })
}

pub fn write_to_dir(file: &ExportFile, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&file.filename);
    std::fs::write(&path, &file.body)?;
    info!("Exported {} to {}", file.filename, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::models::Listing;
    use crate::render::RowRenderer;
    use rstest::rstest;
    use tempfile::TempDir;

    fn rows() -> Vec<ListingRow> {
        let listing = Listing {
            title: "Joe's \"Best\" Pizza".to_string(),
            rating: "4.5".to_string(),
            review_count: "(120)".to_string(),
            company_url: "https://joespizza.example/".to_string(),
            href: "https://www.google.com/maps/place/joes-pizza".to_string(),
            ..Default::default()
        };
        RowRenderer::new(&ExtractorConfig::default()).rows(&[listing])
    }

    #[rstest]
    #[case(Some("My List!"), ExportFormat::Xls, "my_list_.xls")]
    #[case(Some("  Pizza 2024  "), ExportFormat::Csv, "pizza_2024.csv")]
    #[case(Some("   "), ExportFormat::Xls, "google-maps-data.xls")]
    #[case(None, ExportFormat::Csv, "google-maps-data.csv")]
    #[case(Some("café"), ExportFormat::Xls, "caf_.xls")]
    fn test_sanitize_filename(
        #[case] input: Option<&str>,
        #[case] format: ExportFormat,
        #[case] expected: &str,
    ) {
        assert_eq!(sanitize_filename(input, "google-maps-data", format), expected);
    }

    #[test]
    fn test_spreadsheet_has_headers_and_link_labels() {
        let html = render_spreadsheet(&rows()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(html.contains("<th>Google Maps Link</th>"));
        assert!(html.contains("Goto Website</a>"));
        assert!(html.contains("Open In Google maps</a>"));
        assert!(html.contains("target=\"_blank\""));
    }

    #[test]
    fn test_spreadsheet_escapes_cell_text() {
        let html = render_spreadsheet(&rows()).unwrap();
        assert!(!html.contains("\"Best\""));
    }

    #[test]
    fn test_csv_quotes_every_field() {
        let body = String::from_utf8(render_csv(&rows()).unwrap()).unwrap();
        let mut lines = body.lines();

        assert_eq!(
            lines.next().unwrap(),
            "\"Title\",\"Closed Status\",\"Rating\",\"Reviews\",\"Phone\",\"Industry\",\
             \"Expensiveness\",\"City\",\"Address\",\"Website\",\"Insta Search\",\"Google Maps Link\""
        );
        let data = lines.next().unwrap();
        assert!(data.starts_with("\"Joe's \"\"Best\"\" Pizza\",\"\",\"4.5\",\"120\""));
        assert!(data.ends_with("\"Goto Website\",\"\",\"Open In Google maps\""));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = TempDir::new().unwrap();
        let file = build_export(&rows(), Some("Out"), "google-maps-data", ExportFormat::Csv).unwrap();

        let path = write_to_dir(&file, &dir.path().join("nested")).unwrap();

        assert_eq!(path.file_name().unwrap(), "out.csv");
        assert_eq!(std::fs::read(path).unwrap(), file.body);
        assert_eq!(file.content_type(), "text/csv");
    }
}
