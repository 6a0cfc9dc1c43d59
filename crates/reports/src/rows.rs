//! Export kinds and the rows each one renders.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use stockdash_inventory::stats;
use stockdash_products::Product;

use crate::export::{ExportError, to_delimited_text};

/// Chart labels longer than this many characters are cut.
const LABEL_LIMIT: usize = 15;

/// Rows of the chart rankings.
const CHART_TOP_N: usize = 10;

const PRODUCT_COLUMNS: [&str; 12] = [
    "id",
    "name",
    "category",
    "location",
    "unit",
    "stock",
    "reorderPoint",
    "cost",
    "price",
    "incoming",
    "barcode",
    "createdAt",
];
const STOCK_COLUMNS: [&str; 3] = ["name", "stock", "category"];
const CATEGORY_COLUMNS: [&str; 2] = ["name", "value"];
const VALUE_COLUMNS: [&str; 3] = ["name", "value", "category"];
const BREAKDOWN_COLUMNS: [&str; 6] = ["key", "items", "quantity", "value", "lowStock", "shortfall"];

/// What an export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// The full product table.
    Products,
    /// Top products by stock.
    Stock,
    /// Item count per category.
    Category,
    /// Top products by stock value.
    Value,
    /// Category roll-up rows.
    Breakdown,
}

impl ExportKind {
    pub const ALL: [ExportKind; 5] = [
        ExportKind::Products,
        ExportKind::Stock,
        ExportKind::Category,
        ExportKind::Value,
        ExportKind::Breakdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Products => "products",
            ExportKind::Stock => "stock",
            ExportKind::Category => "category",
            ExportKind::Value => "value",
            ExportKind::Breakdown => "breakdown",
        }
    }

    /// `products_<date>.csv` for the table, `report_<kind>_<date>.csv` otherwise.
    pub fn filename(&self, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        match self {
            ExportKind::Products => format!("products_{date}.csv"),
            kind => format!("report_{}_{date}.csv", kind.as_str()),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ExportError::UnknownKind(s.to_string()))
    }
}

/// A rendered export, ready to be written or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub filename: String,
    pub content: String,
}

/// Cut `name` to 15 characters plus `"..."` when longer.
pub fn truncate_label(name: &str) -> String {
    match name.char_indices().nth(LABEL_LIMIT) {
        Some((cut, _)) => format!("{}...", &name[..cut]),
        None => name.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct StockRow<'a> {
    name: String,
    stock: u64,
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct ValueRow<'a> {
    name: String,
    value: String,
    category: &'a str,
}

/// Render `kind` from `products`. `categories` is the category domain used
/// by the category and breakdown exports.
pub fn build_export(
    kind: ExportKind,
    products: &[Product],
    categories: &[String],
    date: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let content = match kind {
        ExportKind::Products => to_delimited_text(products, &PRODUCT_COLUMNS)?,
        ExportKind::Stock => {
            let rows: Vec<StockRow<'_>> = stats::top_stock_items(products, CHART_TOP_N)
                .into_iter()
                .map(|p| StockRow {
                    name: truncate_label(&p.name),
                    stock: p.stock,
                    category: &p.category,
                })
                .collect();
            to_delimited_text(&rows, &STOCK_COLUMNS)?
        }
        ExportKind::Category => {
            to_delimited_text(&stats::category_shares(products, categories), &CATEGORY_COLUMNS)?
        }
        ExportKind::Value => {
            let rows: Vec<ValueRow<'_>> = stats::top_value_items(products, CHART_TOP_N)
                .into_iter()
                .map(|p| ValueRow {
                    name: truncate_label(&p.name),
                    value: format!("{:.2}", p.stock_value()),
                    category: &p.category,
                })
                .collect();
            to_delimited_text(&rows, &VALUE_COLUMNS)?
        }
        ExportKind::Breakdown => {
            to_delimited_text(&stats::category_breakdown(products, categories), &BREAKDOWN_COLUMNS)?
        }
    };

    let artifact = ExportArtifact {
        kind,
        filename: kind.filename(date),
        content,
    };
    tracing::debug!(
        kind = %kind,
        filename = %artifact.filename,
        rows = products.len(),
        "export rendered"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stockdash_core::ProductId;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn product(id: &str, name: &str, category: &str, stock: u64, cost: f64) -> Product {
        Product {
            id: ProductId::new(id).unwrap(),
            name: name.to_string(),
            category: category.to_string(),
            location: "A-01".to_string(),
            unit: "Adet".to_string(),
            stock,
            reorder_point: 5,
            cost,
            price: cost * 2.0,
            incoming: 0,
            barcode: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("kalem", "Kalem", "Kırtasiye", 40, 1.5),
            product("canta", "Omuz Çantası Deri Kahverengi", "Aksesuar", 3, 120.0),
            product("defter", "Defter, Kareli", "Kırtasiye", 12, 4.25),
        ]
    }

    fn export(kind: ExportKind) -> ExportArtifact {
        build_export(kind, &catalog(), &categories(), date()).unwrap()
    }

    fn categories() -> Vec<String> {
        vec!["Kırtasiye".to_string(), "Aksesuar".to_string(), "Giyim".to_string()]
    }

    #[test]
    fn kinds_parse_and_name_files() {
        assert_eq!("Value".parse::<ExportKind>().unwrap(), ExportKind::Value);
        assert!(matches!("pdf".parse::<ExportKind>(), Err(ExportError::UnknownKind(_))));
        assert_eq!(ExportKind::Products.filename(date()), "products_2024-03-09.csv");
        assert_eq!(ExportKind::Stock.filename(date()), "report_stock_2024-03-09.csv");
    }

    #[test]
    fn labels_are_cut_by_characters_not_bytes() {
        assert_eq!(truncate_label("Kalem"), "Kalem");
        assert_eq!(truncate_label("Omuz Çantası De"), "Omuz Çantası De");
        assert_eq!(truncate_label("Omuz Çantası Deri"), "Omuz Çantası De...");
    }

    #[test]
    fn product_table_quotes_names_with_commas() {
        let artifact = export(ExportKind::Products);
        let lines: Vec<&str> = artifact.content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "id,name,category,location,unit,stock,reorderPoint,\
             cost,price,incoming,barcode,createdAt"
        );
        assert!(
            lines[3].starts_with("defter,\"Defter, Kareli\",Kırtasiye,A-01,Adet,12,5,4.25,8.5,0,,")
        );
    }

    #[test]
    fn stock_export_ranks_and_truncates() {
        let artifact = build_export(ExportKind::Stock, &catalog(), &categories(), date()).unwrap();
        assert_eq!(
            artifact.content,
            "name,stock,category\n\
             Kalem,40,Kırtasiye\n\
             \"Defter, Kareli\",12,Kırtasiye\n\
             Omuz Çantası De...,3,Aksesuar"
        );
    }

    #[test]
    fn value_export_uses_two_decimals() {
        let artifact = build_export(ExportKind::Value, &catalog(), &categories(), date()).unwrap();
        let lines: Vec<&str> = artifact.content.lines().collect();
        assert_eq!(lines[1], "Omuz Çantası De...,360.00,Aksesuar");
        assert_eq!(lines[2], "Kalem,60.00,Kırtasiye");
        assert_eq!(lines[3], "\"Defter, Kareli\",51.00,Kırtasiye");
    }

    #[test]
    fn category_exports_keep_empty_groups() {
        let shares = build_export(ExportKind::Category, &catalog(), &categories(), date()).unwrap();
        assert_eq!(shares.content, "name,value\nKırtasiye,2\nAksesuar,1\nGiyim,0");

        let breakdown = export(ExportKind::Breakdown);
        let last = breakdown.content.lines().last().unwrap();
        assert_eq!(last, "Giyim,0,0,0.0,0,0");
        assert_eq!(breakdown.filename, "report_breakdown_2024-03-09.csv");
    }
}
