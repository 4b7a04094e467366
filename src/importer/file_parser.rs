// ==========================================
// 商品目录后台 - 文件解析器实现
// ==========================================
// 阶段 0: 文件内容 → ImportRow（列名 → 文本值）
// 支持: CSV（朴素切分 / RFC 4180）、Excel (.xlsx/.xls)
// 约束: 不做类型转换；缺失的尾列补空串，多余的列忽略
// ==========================================

use crate::config::CsvMode;
use crate::domain::import::ImportRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::product_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Reader};
use csv::{ReaderBuilder, Trim};
use std::io::Cursor;
use std::path::Path;

pub const CONTENT_TYPE_CSV: &str = "text/csv";
pub const CONTENT_TYPE_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CONTENT_TYPE_XLS: &str = "application/vnd.ms-excel";

/// 允许上传的 MIME 类型
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = [CONTENT_TYPE_CSV, CONTENT_TYPE_XLSX, CONTENT_TYPE_XLS];

/// 去掉 MIME 参数（如 `; charset=utf-8`）并转小写
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// 按扩展名推断 MIME 类型（本地文件导入用）
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "csv" => Some(CONTENT_TYPE_CSV),
        "xlsx" => Some(CONTENT_TYPE_XLSX),
        "xls" => Some(CONTENT_TYPE_XLS),
        _ => None,
    }
}

/// 按 UTF-8 解码，去掉 BOM
fn decode_utf8(bytes: &[u8]) -> ImportResult<String> {
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// 表头与一行值拼成 ImportRow
fn zip_row<I>(headers: &[String], values: I) -> ImportRow
where
    I: IntoIterator<Item = String>,
{
    let mut values = values.into_iter();
    let mut row = ImportRow::with_capacity(headers.len());
    for header in headers {
        let value = values.next().unwrap_or_default();
        row.insert(header.clone(), value);
    }
    row
}

// ==========================================
// 朴素 CSV 解析（默认）
// ==========================================
// 按 '\n' 分行，丢弃空白行；按 ',' 切分，trim 后去除所有 '"'
// 引号内的逗号不受保护
pub struct NaiveCsvParser;

impl NaiveCsvParser {
    fn clean(cell: &str) -> String {
        cell.trim().replace('"', "")
    }

    pub fn parse_text(&self, text: &str) -> Vec<ImportRow> {
        let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();

        // 表头 + 至少一行数据
        if lines.len() < 2 {
            return Vec::new();
        }

        let headers: Vec<String> = lines[0].split(',').map(Self::clean).collect();

        lines[1..]
            .iter()
            .map(|line| zip_row(&headers, line.split(',').map(Self::clean)))
            .collect()
    }
}

impl FileParser for NaiveCsvParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<ImportRow>> {
        let text = decode_utf8(bytes)?;
        Ok(self.parse_text(&text))
    }
}

// ==========================================
// RFC 4180 CSV 解析
// ==========================================
pub struct StrictCsvParser;

impl FileParser for StrictCsvParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<ImportRow>> {
        let text = decode_utf8(bytes)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(zip_row(&headers, record.iter().map(|v| v.to_string())));
        }

        Ok(records)
    }
}

// ==========================================
// Excel 解析（第一个工作表）
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<ImportRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = match sheet_names.first() {
            Some(name) => name.clone(),
            None => return Ok(Vec::new()),
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        for data_row in rows {
            let values: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            // 跳过完全空白的行
            if values.iter().all(|v| v.is_empty()) {
                continue;
            }

            records.push(zip_row(&headers, values));
        }

        Ok(records)
    }
}

// ==========================================
// 通用文件解析器（根据 MIME 类型选择）
// ==========================================
pub struct UniversalFileParser {
    csv_mode: CsvMode,
}

impl UniversalFileParser {
    pub fn new(csv_mode: CsvMode) -> Self {
        Self { csv_mode }
    }

    /// 按 MIME 类型选择解析器
    pub fn parser_for(&self, content_type: &str) -> ImportResult<Box<dyn FileParser>> {
        let essence = normalize_content_type(content_type);
        match essence.as_str() {
            CONTENT_TYPE_CSV => match self.csv_mode {
                CsvMode::Naive => Ok(Box::new(NaiveCsvParser)),
                CsvMode::Rfc4180 => Ok(Box::new(StrictCsvParser)),
            },
            CONTENT_TYPE_XLSX | CONTENT_TYPE_XLS => Ok(Box::new(ExcelParser)),
            _ => Err(ImportError::UnsupportedContentType(content_type.to_string())),
        }
    }

    pub fn parse(&self, content_type: &str, bytes: &[u8]) -> ImportResult<Vec<ImportRow>> {
        self.parser_for(content_type)?.parse_rows(bytes)
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(CsvMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(text: &str) -> Vec<ImportRow> {
        NaiveCsvParser.parse_rows(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_naive_basic_rows() {
        let rows = naive("sku,name,source\r\nA1, Mug ,own\r\n\r\nA2,\"Cup\",online\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["sku"], "A1");
        assert_eq!(rows[0]["name"], "Mug");
        assert_eq!(rows[0]["source"], "own");
        assert_eq!(rows[1]["name"], "Cup");
        // 表头顺序保持
        let keys: Vec<_> = rows[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["sku", "name", "source"]);
    }

    #[test]
    fn test_naive_requires_header_and_data() {
        assert!(naive("").is_empty());
        assert!(naive("sku,name\n   \n").is_empty());
        assert!(naive("\n\n").is_empty());
    }

    #[test]
    fn test_naive_missing_and_surplus_values() {
        let rows = naive("sku,name,weight\nA1\nA2,Cup,1.5,extra");

        assert_eq!(rows[0]["name"], "");
        assert_eq!(rows[0]["weight"], "");
        assert_eq!(rows[1]["weight"], "1.5");
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_naive_splits_quoted_commas() {
        // 朴素模式不保护引号内逗号
        let rows = naive("sku,name,source\nA1,\"Mug, large\",own");
        assert_eq!(rows[0]["name"], "Mug");
        assert_eq!(rows[0]["source"], "large");
    }

    #[test]
    fn test_strict_keeps_quoted_commas() {
        let rows = StrictCsvParser
            .parse_rows(b"sku,name,source\nA1,\"Mug, large\",own\nA2,Cup\n")
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Mug, large");
        assert_eq!(rows[0]["source"], "own");
        assert_eq!(rows[1]["source"], "");
    }

    #[test]
    fn test_strict_header_only_is_empty() {
        assert!(StrictCsvParser.parse_rows(b"sku,name\n").unwrap().is_empty());
        assert!(StrictCsvParser.parse_rows(b"").unwrap().is_empty());
    }

    #[test]
    fn test_bom_and_invalid_utf8() {
        let rows = naive("\u{feff}sku,name\nA1,Mug");
        assert_eq!(rows[0]["sku"], "A1");

        let err = NaiveCsvParser.parse_rows(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ImportError::InvalidEncoding(_)));
    }

    #[test]
    fn test_dispatch_by_content_type() {
        let parser = UniversalFileParser::new(CsvMode::Rfc4180);
        let rows = parser
            .parse("text/csv; charset=utf-8", b"sku,name\nA1,\"x, y\"")
            .unwrap();
        assert_eq!(rows[0]["name"], "x, y");

        let err = parser.parse("image/png", b"whatever").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedContentType(_)));

        let err = parser.parse(CONTENT_TYPE_XLSX, b"not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::ExcelParseError(_)));
    }

    #[test]
    fn test_excel_first_sheet_rows() {
        let bytes = include_bytes!("../../tests/fixtures/products_valid.xlsx");
        let rows = ExcelParser.parse_rows(bytes).unwrap();

        // 第 3 行为空白行
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["sku"], "XL-001");
        assert_eq!(rows[0]["regularPrice"], "9.5");
        assert_eq!(rows[0]["weight"], "1.25");
        assert_eq!(rows[0]["quantity"], "3");
        assert_eq!(rows[0]["variantSku"], "");
        assert_eq!(rows[1]["regularPrice"], "24");
        assert_eq!(rows[1]["variantSku"], "XL-002-WHT");
        let keys: Vec<_> = rows[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys[..4], ["sku", "name", "source", "regularPrice"]);
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("a/b.CSV")), Some(CONTENT_TYPE_CSV));
        assert_eq!(content_type_for_path(Path::new("b.xlsx")), Some(CONTENT_TYPE_XLSX));
        assert_eq!(content_type_for_path(Path::new("b.txt")), None);
    }
}
