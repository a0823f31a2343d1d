//! Data-table extractor.
//!
//! Finds the location table on a page (styled table first, any table second),
//! walks its body rows and hands each row's cells to the classifier.

use std::sync::LazyLock;

use reefpoints_shared::RegionBounds;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::classify::{MIN_ROW_CELLS, RowCell, classify_row, collapse_whitespace};
use super::{ExtractContext, ExtractMethod, Extraction, LocationExtractor};

static STYLED_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.table, table.table-hover, table.table-sm, table.table-bordered")
        .expect("valid selector")
});
static ANY_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TBODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static DD_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.dd").expect("valid selector"));

/// Extracts locations from the page's data table.
pub struct TableExtractor;

impl LocationExtractor for TableExtractor {
    fn detect(&self, doc: &Html) -> bool {
        find_data_table(doc).is_some()
    }

    fn extract(&self, doc: &Html, ctx: &ExtractContext<'_>) -> Extraction {
        let Some(table) = find_data_table(doc) else {
            return Extraction::empty(ExtractMethod::Table);
        };
        extract_table(table, ctx.bounds)
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Locate the data table: the first table carrying one of the known style
/// classes, else the first table in the document.
pub fn find_data_table(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&STYLED_TABLE)
        .next()
        .or_else(|| doc.select(&ANY_TABLE).next())
}

/// Cell groups for every row with at least [`MIN_ROW_CELLS`] `<td>` cells.
///
/// Rows come from the table's body section when it has one, otherwise from
/// the whole table. Shorter rows (headers, spacers) are skipped.
pub fn table_rows(table: ElementRef<'_>) -> Vec<Vec<RowCell>> {
    let rows: Vec<ElementRef<'_>> = match table.select(&TBODY).next() {
        Some(tbody) => tbody.select(&ROW).collect(),
        None => {
            debug!("no tbody found, checking all rows");
            table.select(&ROW).collect()
        }
    };

    rows.into_iter()
        .map(row_cells)
        .filter(|cells| cells.len() >= MIN_ROW_CELLS)
        .collect()
}

/// Read the `<td>` children of a row into classifier cells.
fn row_cells(row: ElementRef<'_>) -> Vec<RowCell> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .map(|td| RowCell {
            text: element_text(td),
            decimal_degrees: td.select(&DD_SPAN).next().map(element_text),
        })
        .collect()
}

/// Whitespace-normalized text content of an element.
fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn extract_table(table: ElementRef<'_>, bounds: &RegionBounds) -> Extraction {
    let rows = table_rows(table);
    debug!(rows = rows.len(), "found data rows in table");

    let mut extraction = Extraction::empty(ExtractMethod::Table);
    extraction.rows_seen = rows.len();

    for cells in &rows {
        match classify_row(cells, bounds) {
            Ok(record) => {
                debug!(
                    name = %record.name,
                    lat = record.latitude(),
                    lon = record.longitude(),
                    depth_ft = ?record.depth,
                    "extracted location"
                );
                extraction.records.push(record);
            }
            Err(reason) => {
                debug!(
                    name = %cells.first().map(|c| c.text.as_str()).unwrap_or_default(),
                    %reason,
                    "row skipped"
                );
                extraction.rows_rejected += 1;
            }
        }
    }

    extraction
}
