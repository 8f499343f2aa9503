//! Column inference for uploaded spreadsheets
//!
//! Suggests which header holds each semantic field by case-insensitive
//! substring match against a fixed, ordered keyword table. Keyword rank wins
//! over header position: every header is tried against the first keyword
//! before any header is tried against the second. The result is only a
//! suggestion; the user confirms or overrides it before validation.

use crate::models::{ColumnMapping, SemanticField, SettlementField, SettlementMapping};

/// Ordered keywords per inventory/cost-sheet field, highest priority first
pub const FIELD_KEYWORDS: &[(SemanticField, &[&str])] = &[
    (
        SemanticField::Sku,
        &["sku", "编号", "货号", "item code", "product code", "code"],
    ),
    (
        SemanticField::ProductName,
        &["product name", "品名", "名称", "商品", "name", "product", "title"],
    ),
    (
        SemanticField::Quantity,
        &["quantity", "数量", "qty", "库存", "stock"],
    ),
    (SemanticField::UnitCost, &["cost", "成本", "单价", "price"]),
    (SemanticField::BatchNumber, &["batch", "批次", "批号", "lot"]),
    (
        SemanticField::ExpirationDate,
        &["expir", "有效期", "过期", "exp date", "best before"],
    ),
    (SemanticField::Date, &["date", "日期", "时间", "time"]),
    (SemanticField::Notes, &["note", "备注", "remark", "comment"]),
];

/// Ordered keywords per settlement report field
pub const SETTLEMENT_KEYWORDS: &[(SettlementField, &[&str])] = &[
    (
        SettlementField::StatementDate,
        &["statement date", "结算日期", "date", "日期"],
    ),
    (
        SettlementField::SettlementAmount,
        &[
            "settlement amount",
            "结算金额",
            "payout",
            "net amount",
            "settlement",
            "amount",
            "金额",
            "结算",
        ],
    ),
    (SettlementField::Sku, &["sku", "货号", "item code", "product code"]),
    (SettlementField::Quantity, &["quantity", "数量", "qty"]),
];

/// Headers holding these never carry a settlement amount
const DATE_KEYWORDS: &[&str] = &["date", "日期", "time", "时间"];

/// First header containing the highest-ranked keyword that matches anything
pub fn match_header<'a>(headers: &'a [String], keywords: &[&str]) -> Option<&'a str> {
    match_header_excluding(headers, keywords, &[])
}

/// Like [`match_header`], skipping headers that contain any `excluded` keyword
pub fn match_header_excluding<'a>(
    headers: &'a [String],
    keywords: &[&str],
    excluded: &[&str],
) -> Option<&'a str> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    keywords.iter().find_map(|keyword| {
        lowered
            .iter()
            .position(|h| h.contains(keyword) && !excluded.iter().any(|x| h.contains(x)))
            .map(|idx| headers[idx].as_str())
    })
}

/// Suggest a mapping for an inventory or cost sheet
pub fn infer_mapping(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    for (field, keywords) in FIELD_KEYWORDS {
        if let Some(header) = match_header(headers, keywords) {
            mapping.set(*field, header);
        }
    }
    mapping
}

/// Suggest a mapping for a settlement report
pub fn infer_settlement_mapping(headers: &[String]) -> SettlementMapping {
    let mut mapping = SettlementMapping::default();
    for (field, keywords) in SETTLEMENT_KEYWORDS {
        let excluded: &[&str] = match field {
            SettlementField::SettlementAmount => DATE_KEYWORDS,
            _ => &[],
        };
        if let Some(header) = match_header_excluding(headers, keywords, excluded) {
            mapping.set(*field, header);
        }
    }
    mapping
}
