// ==========================================
// 商品目录后台 - 批量导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 解析 → 行校验 → 查重 → 映射 → 落库 → 批次终态
// ==========================================

use crate::domain::import::{ImportCandidate, ImportOutcome, ImportRow, SkuConflict};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 批量导入主接口
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 导入上传内容
    ///
    /// # 参数
    /// - file_name: 源文件名（写入批次记录）
    /// - content_type: MIME 类型（决定解析器）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 批次已进入终态（completed / failed）
    /// - Err(EmptyFile / UnsupportedContentType): 输入形状错误，未创建批次
    /// - Err: 其他错误（解码失败、数据库错误等）
    ///
    /// # 导入流程
    /// 1. 按 content_type 解析为 ImportRow
    /// 2. 创建批次（processing）
    /// 3. 逐行校验（错误累积）
    /// 4. 查重（文件内 + 库内）
    /// 5. 校验失败 → 批次 failed，不落库
    /// 6. 逐行落库（单行事务，失败不中断）
    /// 7. 写入批次终态
    async fn import_bytes(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome>;

    /// 从本地文件导入（content_type 由扩展名推断）
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: NaiveCsvParser, StrictCsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容为原始行（列名 → 值，保持表头顺序）
    ///
    /// # 返回
    /// - Ok(vec![]): 无表头或无数据行
    /// - Err: 解码失败、格式错误
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<ImportRow>>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行级校验接口（阶段 1）
// 实现者: RowValidatorImpl
pub trait RowValidator: Send + Sync {
    /// 校验单行，返回全部错误（不短路）
    ///
    /// # 参数
    /// - row: 原始行
    /// - row_index: 0 起始数据行序号（错误文本中显示为 index + 1）
    fn validate(&self, row: &ImportRow, row_index: usize) -> Vec<String>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: SKU 查重接口（阶段 2）
// 实现者: ConflictHandlerImpl
pub trait ConflictHandler: Send + Sync {
    /// 文件内重复（同一 SKU 第二次及以后出现）
    fn detect_intra_batch(&self, rows: &[ImportRow]) -> Vec<SkuConflict>;

    /// 库内冲突
    ///
    /// # 参数
    /// - existing_skus: 库中已存在的商品 SKU（由调用方逐行查询得到）
    fn detect_existing(
        &self,
        rows: &[ImportRow],
        existing_skus: &HashSet<String>,
    ) -> Vec<SkuConflict>;

    /// 合并文件内重复与库内冲突
    ///
    /// 按行号排序；同一行内文件重复在前
    fn merge(&self, intra_batch: Vec<SkuConflict>, existing: Vec<SkuConflict>) -> Vec<SkuConflict>;
}

// ==========================================
// CandidateMapper Trait
// ==========================================
// 用途: 行 → 强类型导入候选（阶段 3）
// 实现者: CandidateMapperImpl
pub trait CandidateMapper: Send + Sync {
    /// 映射单行
    ///
    /// # 返回
    /// - Err(InvalidNumber): 可选数值列无法解析（计为该行落库失败）
    fn map_row(
        &self,
        row: &ImportRow,
        row_index: usize,
        batch_id: &str,
    ) -> ImportResult<ImportCandidate>;
}
