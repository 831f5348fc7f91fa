//! Table extraction from downloaded documents.
//!
//! `TableSource` is the capability boundary the answer heuristics consume:
//! an ordered sequence of pages, each yielding zero or more tables whose
//! first row is the header. The concrete adapter reconstructs tables from
//! the text layout of a PDF; tests supply fixture sources.

use anyhow::Result;
use regex::Regex;
use std::path::Path;

pub type Row = Vec<String>;
pub type Table = Vec<Row>;

/// A document that exposes per-page tabular data.
pub trait TableSource {
    fn page_count(&self) -> usize;

    /// Tables found on the page at `index` (zero-based).
    fn tables_on_page(&self, index: usize) -> Vec<Table>;
}

/// PDF pages as extracted text, one string per page.
pub struct PdfPages {
    pages: Vec<String>,
}

impl PdfPages {
    /// Extract per-page text from a PDF file.
    pub fn open(path: &Path) -> Result<Self> {
        let pages = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| anyhow::anyhow!("failed to read PDF at {}: {e}", path.display()))?;
        Ok(Self { pages })
    }
}

impl TableSource for PdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tables_on_page(&self, index: usize) -> Vec<Table> {
        self.pages
            .get(index)
            .map(|text| tables_from_text(text))
            .unwrap_or_default()
    }
}

/// Group contiguous multi-cell lines into tables.
///
/// Cells are split on runs of two or more spaces or a tab — the column gaps
/// text extraction preserves from a PDF's table layout. A run of fewer than
/// two table-like lines is discarded as prose.
fn tables_from_text(text: &str) -> Vec<Table> {
    let cell_split = Regex::new(r"\s{2,}|\t").expect("valid regex");

    let mut tables = Vec::new();
    let mut current: Table = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        let cells: Row = cell_split
            .split(line)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if cells.len() >= 2 {
            current.push(cells);
        } else if !current.is_empty() {
            if current.len() >= 2 {
                tables.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        tables.push(current);
    }

    tables
}

/// Sum the "value" column of the first matching table on the second page.
///
/// Returns `None` when the document has fewer than two pages, the second
/// page has no tables, or none of them carries a column whose trimmed
/// lower-cased header equals "value". Non-numeric entries are excluded from
/// the sum rather than failing it.
pub fn second_page_value_sum(doc: &dyn TableSource) -> Option<f64> {
    if doc.page_count() < 2 {
        return None;
    }

    for table in doc.tables_on_page(1) {
        let Some(header) = table.first() else {
            continue;
        };
        let Some(col) = header
            .iter()
            .position(|h| h.trim().to_lowercase() == "value")
        else {
            continue;
        };

        let sum = table[1..]
            .iter()
            .filter_map(|row| row.get(col))
            .filter_map(|cell| cell.trim().parse::<f64>().ok())
            .sum();
        return Some(sum);
    }

    None
}
