//! Column mapping models for spreadsheet imports

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Semantic fields an inventory or cost sheet column can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Sku,
    ProductName,
    Quantity,
    UnitCost,
    BatchNumber,
    ExpirationDate,
    Date,
    Notes,
}

impl SemanticField {
    pub const ALL: [SemanticField; 8] = [
        SemanticField::Sku,
        SemanticField::ProductName,
        SemanticField::Quantity,
        SemanticField::UnitCost,
        SemanticField::BatchNumber,
        SemanticField::ExpirationDate,
        SemanticField::Date,
        SemanticField::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Sku => "sku",
            SemanticField::ProductName => "product_name",
            SemanticField::Quantity => "quantity",
            SemanticField::UnitCost => "unit_cost",
            SemanticField::BatchNumber => "batch_number",
            SemanticField::ExpirationDate => "expiration_date",
            SemanticField::Date => "date",
            SemanticField::Notes => "notes",
        }
    }
}

impl std::fmt::Display for SemanticField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields an inventory import cannot proceed without
pub const INVENTORY_REQUIRED_FIELDS: &[SemanticField] = &[
    SemanticField::Sku,
    SemanticField::ProductName,
    SemanticField::Quantity,
    SemanticField::UnitCost,
];

/// Fields a cost sheet import cannot proceed without
pub const COST_SHEET_REQUIRED_FIELDS: &[SemanticField] =
    &[SemanticField::Sku, SemanticField::UnitCost];

/// Where the quantity of each row comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "column", rename_all = "snake_case")]
pub enum QuantitySource {
    Column(String),
    /// Every row counts as a single unit
    DefaultOne,
}

/// Header chosen for each semantic field during one import session.
///
/// Produced by the inferencer as a suggestion and sent back by the user,
/// possibly edited, to confirm the import. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub sku: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<QuantitySource>,
    pub unit_cost: Option<String>,
    pub batch_number: Option<String>,
    pub expiration_date: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl ColumnMapping {
    /// Header mapped to `field`; `None` for the default-one quantity sentinel
    pub fn header(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::Sku => self.sku.as_deref(),
            SemanticField::ProductName => self.product_name.as_deref(),
            SemanticField::Quantity => match &self.quantity {
                Some(QuantitySource::Column(header)) => Some(header.as_str()),
                _ => None,
            },
            SemanticField::UnitCost => self.unit_cost.as_deref(),
            SemanticField::BatchNumber => self.batch_number.as_deref(),
            SemanticField::ExpirationDate => self.expiration_date.as_deref(),
            SemanticField::Date => self.date.as_deref(),
            SemanticField::Notes => self.notes.as_deref(),
        }
    }

    pub fn set(&mut self, field: SemanticField, header: impl Into<String>) {
        let header = Some(header.into());
        match field {
            SemanticField::Sku => self.sku = header,
            SemanticField::ProductName => self.product_name = header,
            SemanticField::Quantity => self.quantity = header.map(QuantitySource::Column),
            SemanticField::UnitCost => self.unit_cost = header,
            SemanticField::BatchNumber => self.batch_number = header,
            SemanticField::ExpirationDate => self.expiration_date = header,
            SemanticField::Date => self.date = header,
            SemanticField::Notes => self.notes = header,
        }
    }

    pub fn is_mapped(&self, field: SemanticField) -> bool {
        match field {
            SemanticField::Quantity => self.quantity.is_some(),
            _ => self.header(field).is_some(),
        }
    }

    /// Check every required field points at a header present in `headers`
    pub fn ensure_complete(
        &self,
        required: &[SemanticField],
        headers: &[String],
    ) -> Result<(), PipelineError> {
        for field in required {
            if !self.is_mapped(*field) {
                return Err(PipelineError::mapping_incomplete(field.as_str()));
            }
            if let Some(header) = self.header(*field) {
                if !headers.iter().any(|h| h == header) {
                    return Err(PipelineError::mapping_incomplete(field.as_str()));
                }
            }
        }
        Ok(())
    }
}

/// Fields of an uploaded sales settlement report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementField {
    StatementDate,
    SettlementAmount,
    Sku,
    Quantity,
}

impl SettlementField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementField::StatementDate => "statement_date",
            SettlementField::SettlementAmount => "settlement_amount",
            SettlementField::Sku => "sku",
            SettlementField::Quantity => "quantity",
        }
    }
}

/// Column mapping for settlement reports fed into the profit analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementMapping {
    pub statement_date: Option<String>,
    pub settlement_amount: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<String>,
}

impl SettlementMapping {
    pub fn header(&self, field: SettlementField) -> Option<&str> {
        match field {
            SettlementField::StatementDate => self.statement_date.as_deref(),
            SettlementField::SettlementAmount => self.settlement_amount.as_deref(),
            SettlementField::Sku => self.sku.as_deref(),
            SettlementField::Quantity => self.quantity.as_deref(),
        }
    }

    pub fn set(&mut self, field: SettlementField, header: impl Into<String>) {
        let header = Some(header.into());
        match field {
            SettlementField::StatementDate => self.statement_date = header,
            SettlementField::SettlementAmount => self.settlement_amount = header,
            SettlementField::Sku => self.sku = header,
            SettlementField::Quantity => self.quantity = header,
        }
    }

    /// Only the amount column is mandatory
    pub fn ensure_complete(&self, headers: &[String]) -> Result<(), PipelineError> {
        match self.settlement_amount.as_deref() {
            Some(header) if headers.iter().any(|h| h == header) => Ok(()),
            _ => Err(PipelineError::mapping_incomplete(
                SettlementField::SettlementAmount.as_str(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_one_counts_as_mapped() {
        let mut mapping = ColumnMapping::default();
        mapping.set(SemanticField::Sku, "SKU");
        mapping.set(SemanticField::ProductName, "Name");
        mapping.set(SemanticField::UnitCost, "Cost");
        mapping.quantity = Some(QuantitySource::DefaultOne);

        let hs = headers(&["SKU", "Name", "Cost"]);
        assert!(mapping
            .ensure_complete(INVENTORY_REQUIRED_FIELDS, &hs)
            .is_ok());
        assert_eq!(mapping.header(SemanticField::Quantity), None);
    }

    #[test]
    fn test_missing_field_reported() {
        let mut mapping = ColumnMapping::default();
        mapping.set(SemanticField::Sku, "SKU");

        let err = mapping
            .ensure_complete(INVENTORY_REQUIRED_FIELDS, &headers(&["SKU"]))
            .unwrap_err();
        assert_eq!(err, PipelineError::mapping_incomplete("product_name"));
    }

    #[test]
    fn test_unknown_header_is_incomplete() {
        let mut mapping = ColumnMapping::default();
        mapping.set(SemanticField::Sku, "Item");
        mapping.set(SemanticField::UnitCost, "Cost");

        let err = mapping
            .ensure_complete(COST_SHEET_REQUIRED_FIELDS, &headers(&["SKU", "Cost"]))
            .unwrap_err();
        assert_eq!(err, PipelineError::mapping_incomplete("sku"));
    }

    #[test]
    fn test_quantity_source_json() {
        let json = serde_json::to_string(&QuantitySource::DefaultOne).unwrap();
        assert_eq!(json, r#"{"source":"default_one"}"#);

        let parsed: QuantitySource =
            serde_json::from_str(r#"{"source":"column","column":"Qty"}"#).unwrap();
        assert_eq!(parsed, QuantitySource::Column("Qty".to_string()));
    }

    #[test]
    fn test_settlement_mapping_requires_amount() {
        let mut mapping = SettlementMapping::default();
        mapping.set(SettlementField::StatementDate, "Date");
        assert!(mapping.ensure_complete(&headers(&["Date"])).is_err());

        mapping.set(SettlementField::SettlementAmount, "Amount");
        assert!(mapping.ensure_complete(&headers(&["Date", "Amount"])).is_ok());
    }
}
