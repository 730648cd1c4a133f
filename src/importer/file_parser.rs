// ==========================================
// 建筑工作室 S 曲线引擎 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 原始行记录（列名 → 文本值），保留文件中的行号
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// RawRecord - 原始行记录
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 数据行号（从 1 开始，不含表头）
    pub row: usize,
    pub fields: HashMap<String, String>,
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（完全空白的行被跳过，但行号保持连续）
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 按表头组装一行；全空返回 None
fn build_record(
    headers: &[String],
    row: usize,
    values: impl Iterator<Item = String>,
) -> Option<RawRecord> {
    let mut fields = HashMap::new();
    for (col_idx, value) in values.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if !header.is_empty() {
                fields.insert(header.clone(), value.trim().to_string());
            }
        }
    }

    if fields.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRecord { row, fields })
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        ensure_exists(file_path)?;

        // 无扩展名的临时文件按 CSV 处理
        let ext = extension_of(file_path);
        if !ext.is_empty() && ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 表头去除 UTF-8 BOM（Excel 另存为 CSV 时常见）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if let Some(raw) = build_record(&headers, idx + 1, record.iter().map(str::to_string)) {
                records.push(raw);
            }
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 按扩展名自动选择 xlsx / xls 读取器
        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            if let Some(raw) = build_record(&headers, idx + 1, data_row.iter().map(|c| c.to_string())) {
                records.push(raw);
            }
        }

        Ok(records)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(file_path),
            other => {
                ensure_exists(file_path)?;
                Err(ImportError::UnsupportedFormat(other.to_string()))
            }
        }
    }
}
