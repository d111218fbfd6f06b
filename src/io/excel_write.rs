use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::error::Result;
use crate::model::CellValue;
use crate::workbook::{CellStyle, ReportWorkbook, Sheet};

const HEADER_FILL: u32 = 0xFFFF00;
const SUBHEADER_FILL: u32 = 0xD3D3D3;

struct Formats {
    header: Format,
    subheader: Format,
    data: Format,
    data_wrapped: Format,
}

impl Formats {
    fn new() -> Self {
        let centered = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::Black);

        Self {
            header: centered
                .clone()
                .set_bold()
                .set_font_color(Color::Black)
                .set_background_color(Color::RGB(HEADER_FILL)),
            subheader: centered
                .clone()
                .set_italic()
                .set_font_color(Color::Black)
                .set_background_color(Color::RGB(SUBHEADER_FILL)),
            data_wrapped: centered.clone().set_text_wrap(),
            data: centered,
        }
    }

    fn for_style(&self, style: CellStyle) -> Option<&Format> {
        match style {
            CellStyle::Header => Some(&self.header),
            CellStyle::Subheader => Some(&self.subheader),
            CellStyle::Data { wrap: true } => Some(&self.data_wrapped),
            CellStyle::Data { wrap: false } => Some(&self.data),
            CellStyle::Plain => None,
        }
    }
}

/// Writes the provided workbook to the given path, replacing any existing
/// file.
pub fn write_workbook(path: &Path, workbook: &ReportWorkbook) -> Result<()> {
    let formats = Formats::new();
    let mut workbook_writer = Workbook::new();

    for sheet in workbook.sheets() {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &formats)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> Result<()> {
    let width = sheet.width();

    for row_idx in 0..sheet.rows.len() {
        let row = row_idx as u32;
        for col_idx in 0..width {
            let col = col_idx as u16;
            let value = sheet.cell(row_idx, col_idx);
            match formats.for_style(sheet.cell_style(row_idx, col_idx)) {
                Some(format) => match value {
                    CellValue::Text(text) if !text.is_empty() => {
                        worksheet.write_string_with_format(row, col, text, format)?;
                    }
                    CellValue::Number(number) => {
                        worksheet.write_number_with_format(row, col, *number, format)?;
                    }
                    _ => {
                        worksheet.write_blank(row, col, format)?;
                    }
                },
                None => match value {
                    CellValue::Text(text) if !text.is_empty() => {
                        worksheet.write_string(row, col, text)?;
                    }
                    CellValue::Number(number) => {
                        worksheet.write_number(row, col, *number)?;
                    }
                    _ => {}
                },
            }
        }

        if let Some(height) = sheet.row_height(row_idx) {
            worksheet.set_row_height(row, height)?;
        }
    }

    if sheet.kind().is_some() {
        for (col_idx, column_width) in sheet.column_widths().into_iter().enumerate() {
            worksheet.set_column_width(col_idx as u16, column_width)?;
        }
    }

    Ok(())
}
