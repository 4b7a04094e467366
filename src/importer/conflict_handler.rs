// ==========================================
// 商品目录后台 - SKU 冲突检测
// ==========================================
// 职责: 检测文件内重复 SKU / 库中已存在的 SKU
// 约束: 空 SKU 不参与查重（由行校验报告）
// ==========================================

use crate::domain::import::{ConflictKind, ImportRow, SkuConflict};
use crate::importer::product_importer_trait::ConflictHandler as ConflictHandlerTrait;
use crate::importer::row_validator::{cell, columns};
use std::collections::{HashMap, HashSet};

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 检测同文件内重复 SKU
    ///
    /// # 返回
    /// - 重复记录列表（不包括第一次出现）
    fn detect_intra_batch(&self, rows: &[ImportRow]) -> Vec<SkuConflict> {
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let sku = cell(row, columns::SKU);
            if sku.is_empty() {
                continue;
            }

            if first_occurrence.contains_key(sku) {
                duplicates.push(SkuConflict {
                    row_number: idx + 1,
                    sku: sku.to_string(),
                    kind: ConflictKind::IntraBatch,
                });
            } else {
                first_occurrence.insert(sku, idx + 1);
            }
        }

        duplicates
    }

    /// 检测库内已存在的 SKU（同一 SKU 的每次出现都报告）
    fn detect_existing(
        &self,
        rows: &[ImportRow],
        existing_skus: &HashSet<String>,
    ) -> Vec<SkuConflict> {
        rows.iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let sku = cell(row, columns::SKU);
                (!sku.is_empty() && existing_skus.contains(sku)).then(|| SkuConflict {
                    row_number: idx + 1,
                    sku: sku.to_string(),
                    kind: ConflictKind::ExistingInStore,
                })
            })
            .collect()
    }

    fn merge(&self, intra_batch: Vec<SkuConflict>, existing: Vec<SkuConflict>) -> Vec<SkuConflict> {
        let mut merged: Vec<SkuConflict> = intra_batch.into_iter().chain(existing).collect();
        // 稳定排序：同一行内文件重复在前
        merged.sort_by_key(|c| c.row_number);
        merged
    }
}
