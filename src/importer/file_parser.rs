// ==========================================
// 待打包订单发运系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析（内存中完成，不落盘）
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv)
// 无扩展名或扩展名未知时按内容嗅探
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FileParser, RawRow, RawSheet};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawSheet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let mut sheet = RawSheet {
            headers,
            ..Default::default()
        };

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            // 表头为第 1 行
            push_row(&mut sheet, idx + 2, cells);
        }

        Ok(sheet)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// calamine 自动识别 xls/xlsx/xlsb/ods
pub struct SpreadsheetParser;

impl FileParser for SpreadsheetParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawSheet> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 只读第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // calamine 的 Range 从第一个非空单元格开始，补齐偏移保证列号与表格一致
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::MissingHeader)?;
        let headers = to_cells(header_row, col_offset);

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let mut sheet = RawSheet {
            headers,
            ..Default::default()
        };

        for (idx, data_row) in rows.enumerate() {
            // 表头所在行号 = row_offset + 1，数据行顺延
            let row_number = row_offset + idx + 2;
            push_row(&mut sheet, row_number, to_cells(data_row, col_offset));
        }

        Ok(sheet)
    }
}

fn to_cells(row: &[Data], col_offset: usize) -> Vec<String> {
    let mut cells = vec![String::new(); col_offset];
    cells.extend(row.iter().map(|cell| cell.to_string().trim().to_string()));
    cells
}

/// 跳过完全空白的行
fn push_row(sheet: &mut RawSheet, row_number: usize, cells: Vec<String>) {
    if cells.iter().all(|v| v.is_empty()) {
        sheet.blank_rows += 1;
        return;
    }
    sheet.rows.push(RawRow { row_number, cells });
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<RawSheet> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile(file_name.to_string()));
        }

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_bytes(bytes),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => SpreadsheetParser.parse_bytes(bytes),
            _ => sniff(file_name, bytes),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawSheet> {
        sniff("", bytes)
    }
}

/// 按内容判断格式：calamine 能打开即为表格，其次要求是 UTF-8 文本才按 CSV
fn sniff(file_name: &str, bytes: &[u8]) -> ImportResult<RawSheet> {
    match SpreadsheetParser.parse_bytes(bytes) {
        Ok(sheet) => Ok(sheet),
        Err(ImportError::ExcelParseError(_)) if std::str::from_utf8(bytes).is_ok() => {
            CsvParser.parse_bytes(bytes)
        }
        Err(ImportError::ExcelParseError(_)) => {
            Err(ImportError::UnsupportedFormat(file_name.to_string()))
        }
        Err(e) => Err(e),
    }
}
