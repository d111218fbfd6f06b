//! In-memory handle on the merged report workbook.
//!
//! The workbook holds cell values only. Styling is derived from position and
//! content when the workbook is rendered, so a workbook loaded from disk and
//! saved again always gets the same layout.
//!
//! Sheets other than [`DETAIL_SHEET`] and [`SUMMARY_SHEET`] are carried over
//! as values too. Saving rewrites them without their formulas (the cached
//! results are kept), without date types (dates become text) and without
//! their original formatting.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::io::{excel_read, excel_write};
use crate::model::CellValue;

/// Sheet listing every merged input report.
pub const DETAIL_SHEET: &str = "Detail";
/// Sheet listing one row per compared pair.
pub const SUMMARY_SHEET: &str = "Summary";
/// Default sheet names that are dropped when a workbook is opened and the
/// sheet holds no cells.
pub const PLACEHOLDER_SHEETS: [&str; 2] = ["Sheet", "Sheet1"];

/// Rows at the top of every known sheet holding the header and subheader.
pub const HEADER_ROWS: usize = 2;
/// Characters added to the longest line of a column.
pub const COLUMN_PADDING: f64 = 5.0;
/// Height, in points, of the header row.
pub const HEADER_ROW_HEIGHT: f64 = 40.0;
/// Height, in points, of the subheader row.
pub const SUBHEADER_ROW_HEIGHT: f64 = 35.0;

static EMPTY_CELL: CellValue = CellValue::Empty;

const DETAIL_HEADERS: [&str; 5] = [
    "REPORT NAME",
    "REPORT PATH",
    "REPORT DataItem",
    "REPORT Datasource",
    "REPORT Data Filters",
];
const DETAIL_SUBHEADERS: [&str; 5] = [
    "Name of the report",
    "Report Path",
    "Report DataItem",
    "Report DataSource",
    "Report Data Filters",
];
const SUMMARY_HEADERS: [&str; 8] = [
    "REPORT NAME",
    "DataItem Matched",
    "DataItem Match %",
    "Data Filters Matched",
    "Data Filters Match %",
    "Datasource Matched",
    "Datasource Match %",
    "Overall Match (%)",
];
const SUMMARY_SUBHEADERS: [&str; 8] = [
    "REPORTS COMBINED",
    "DataItem Matched",
    "Shows the percentage match between report data items",
    "Data Filters Matched",
    "Shows the percentage match between report data filters",
    "Datasource Matched",
    "Shows the percentage match between report Datasource",
    "Shows the overall report matching percentage",
];

/// The two sheets the tool writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Detail,
    Summary,
}

impl SheetKind {
    pub fn sheet_name(self) -> &'static str {
        match self {
            SheetKind::Detail => DETAIL_SHEET,
            SheetKind::Summary => SUMMARY_SHEET,
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<Self> {
        match name {
            DETAIL_SHEET => Some(SheetKind::Detail),
            SUMMARY_SHEET => Some(SheetKind::Summary),
            _ => None,
        }
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            SheetKind::Detail => &DETAIL_HEADERS,
            SheetKind::Summary => &SUMMARY_HEADERS,
        }
    }

    pub fn subheaders(self) -> &'static [&'static str] {
        match self {
            SheetKind::Detail => &DETAIL_SUBHEADERS,
            SheetKind::Summary => &SUMMARY_SUBHEADERS,
        }
    }
}

/// Presentation of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Bold, centered, bordered, header fill.
    Header,
    /// Italic, centered, bordered, subheader fill.
    Subheader,
    /// Centered and bordered, wrapping when the value spans several lines.
    Data { wrap: bool },
    /// Written without formatting.
    Plain,
}

/// A named sheet and its cell values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    fn with_headers(kind: SheetKind) -> Self {
        let to_row = |labels: &[&str]| -> Vec<CellValue> {
            labels.iter().map(|label| CellValue::text(*label)).collect()
        };
        Self {
            name: kind.sheet_name().to_string(),
            rows: vec![to_row(kind.headers()), to_row(kind.subheaders())],
        }
    }

    /// True for an empty sheet carrying a default name.
    pub fn is_placeholder(&self) -> bool {
        self.rows.is_empty() && PLACEHOLDER_SHEETS.contains(&self.name.as_str())
    }

    pub fn kind(&self) -> Option<SheetKind> {
        SheetKind::from_sheet_name(&self.name)
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Rows below the header block.
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        match self.kind() {
            Some(_) => self.rows.get(HEADER_ROWS..).unwrap_or(&[]),
            None => &self.rows,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Style applied to the cell at the given zero-based position.
    pub fn cell_style(&self, row: usize, col: usize) -> CellStyle {
        if self.kind().is_none() {
            return CellStyle::Plain;
        }
        match row {
            0 => CellStyle::Header,
            1 => CellStyle::Subheader,
            _ => CellStyle::Data {
                wrap: self.cell(row, col).is_multiline(),
            },
        }
    }

    /// Width of every column: the longest line in the column plus padding.
    pub fn column_widths(&self) -> Vec<f64> {
        (0..self.width())
            .map(|col| {
                let longest = self
                    .rows
                    .iter()
                    .map(|cells| cells.get(col).map_or(0, CellValue::longest_line))
                    .max()
                    .unwrap_or(0);
                longest as f64 + COLUMN_PADDING
            })
            .collect()
    }

    /// Fixed height of the row, if it has one.
    pub fn row_height(&self, row: usize) -> Option<f64> {
        self.kind()?;
        match row {
            0 => Some(HEADER_ROW_HEIGHT),
            1 => Some(SUBHEADER_ROW_HEIGHT),
            _ => None,
        }
    }
}

/// Owned workbook. Open it, append rows, then [`save`](Self::save) once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportWorkbook {
    sheets: Vec<Sheet>,
}

impl ReportWorkbook {
    /// Creates an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a workbook from already loaded sheets, dropping empty
    /// placeholders.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        let sheets = sheets
            .into_iter()
            .filter(|sheet| !sheet.is_placeholder())
            .collect();
        Self { sheets }
    }

    /// Loads the workbook at `path`, or starts an empty one when the file
    /// does not exist yet.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let sheets = excel_read::read_sheets(path)?;
            debug!(path = %path.display(), sheet_count = sheets.len(), "loaded workbook");
            Ok(Self::from_sheets(sheets))
        } else {
            debug!(path = %path.display(), "creating workbook");
            Ok(Self::new())
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, kind: SheetKind) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == kind.sheet_name())
    }

    /// Appends `cells` below the last row of the sheet, creating the sheet
    /// with its header rows first if it does not exist.
    pub fn append(&mut self, kind: SheetKind, cells: Vec<CellValue>) {
        let index = match self
            .sheets
            .iter()
            .position(|sheet| sheet.name == kind.sheet_name())
        {
            Some(index) => index,
            None => {
                debug!(sheet = kind.sheet_name(), "initialising sheet headers");
                self.sheets.push(Sheet::with_headers(kind));
                self.sheets.len() - 1
            }
        };
        let sheet = &mut self.sheets[index];
        sheet.rows.push(cells);
        debug!(
            sheet = kind.sheet_name(),
            data_rows = sheet.data_rows().len(),
            "appended row"
        );
    }

    /// Writes the whole workbook to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        excel_write::write_workbook(path, self)?;
        debug!(path = %path.display(), sheet_count = self.sheets.len(), "saved workbook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_append_writes_headers_once() {
        let mut workbook = ReportWorkbook::new();
        workbook.append(SheetKind::Detail, vec![CellValue::text("a")]);
        workbook.append(SheetKind::Detail, vec![CellValue::text("b")]);

        let sheet = workbook.sheet(SheetKind::Detail).expect("detail sheet");
        assert_eq!(sheet.rows.len(), HEADER_ROWS + 2);
        assert_eq!(sheet.rows[0][0], CellValue::text("REPORT NAME"));
        assert_eq!(sheet.rows[1][0], CellValue::text("Name of the report"));
        assert_eq!(sheet.data_rows().len(), 2);
        assert!(workbook.sheet(SheetKind::Summary).is_none());
    }

    #[test]
    fn placeholder_sheets_are_dropped() {
        let workbook = ReportWorkbook::from_sheets(vec![
            Sheet {
                name: "Sheet".into(),
                rows: Vec::new(),
            },
            Sheet {
                name: "Sheet1".into(),
                rows: Vec::new(),
            },
            Sheet {
                name: "Notes".into(),
                rows: vec![vec![CellValue::text("kept")]],
            },
        ]);
        let names: Vec<&str> = workbook.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Notes"]);
    }

    #[test]
    fn populated_default_sheet_is_kept() {
        let workbook = ReportWorkbook::from_sheets(vec![Sheet {
            name: "Sheet1".into(),
            rows: vec![vec![CellValue::text("user notes")]],
        }]);
        assert_eq!(workbook.sheets().len(), 1);
        assert!(!workbook.sheets()[0].is_placeholder());
    }

    #[test]
    fn wrap_only_for_multiline_values() {
        let mut workbook = ReportWorkbook::new();
        workbook.append(
            SheetKind::Summary,
            vec![
                CellValue::text("pair"),
                CellValue::text("id,\nname"),
                CellValue::Number(50.0),
            ],
        );
        let sheet = workbook.sheet(SheetKind::Summary).expect("summary sheet");

        assert_eq!(sheet.cell_style(0, 0), CellStyle::Header);
        assert_eq!(sheet.cell_style(1, 1), CellStyle::Subheader);
        assert_eq!(sheet.cell_style(2, 0), CellStyle::Data { wrap: false });
        assert_eq!(sheet.cell_style(2, 1), CellStyle::Data { wrap: true });
        assert_eq!(sheet.cell_style(2, 2), CellStyle::Data { wrap: false });
        assert_eq!(sheet.cell_style(2, 7), CellStyle::Data { wrap: false });
    }

    #[test]
    fn column_width_follows_longest_line() {
        let mut workbook = ReportWorkbook::new();
        workbook.append(
            SheetKind::Detail,
            vec![
                CellValue::text("r"),
                CellValue::text("p"),
                CellValue::text("short,\nthe_longest_line_here,\nx"),
            ],
        );
        let sheet = workbook.sheet(SheetKind::Detail).expect("detail sheet");
        let widths = sheet.column_widths();

        assert_eq!(widths.len(), 5);
        assert_eq!(widths[0], "Name of the report".len() as f64 + COLUMN_PADDING);
        assert_eq!(
            widths[2],
            "the_longest_line_here,".len() as f64 + COLUMN_PADDING
        );
        assert_eq!(sheet.row_height(0), Some(HEADER_ROW_HEIGHT));
        assert_eq!(sheet.row_height(1), Some(SUBHEADER_ROW_HEIGHT));
        assert_eq!(sheet.row_height(2), None);
    }
}
