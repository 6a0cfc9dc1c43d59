use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockdash_core::{DomainError, DomainResult, ProductId};

/// Unit assigned to drafts that do not name one.
pub const DEFAULT_UNIT: &str = "Adet";

/// Stock classification of a single product against its reorder point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// `stock == 0`.
    OutOfStock,
    /// `0 < stock <= reorder_point`.
    Low,
    /// `stock > reorder_point`.
    Healthy,
}

impl StockLevel {
    /// Out of stock or low stock.
    pub fn is_critical(&self) -> bool {
        !matches!(self, StockLevel::Healthy)
    }
}

/// A product record (matches the API response shape).
///
/// Quantities are unsigned, so a decoded record can never carry negative
/// stock, reorder point or incoming quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub reorder_point: u64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub incoming: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        if self.stock == 0 {
            StockLevel::OutOfStock
        } else if self.stock <= self.reorder_point {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_level() == StockLevel::Low
    }

    /// At or below the reorder point (low or out of stock).
    pub fn needs_reorder(&self) -> bool {
        self.stock <= self.reorder_point
    }

    /// Units missing to reach the reorder point.
    pub fn shortfall(&self) -> u64 {
        self.reorder_point.saturating_sub(self.stock)
    }

    /// `stock * effective_unit_value`.
    pub fn stock_value(&self) -> f64 {
        self.stock as f64 * effective_unit_value(self)
    }

    pub fn cost_value(&self) -> f64 {
        self.stock as f64 * self.cost
    }

    pub fn sale_value(&self) -> f64 {
        self.stock as f64 * self.price
    }

    /// Stock after applying `delta`, or `None` when it would go below zero.
    pub fn stock_after(&self, delta: i64) -> Option<u64> {
        self.stock.checked_add_signed(delta)
    }

    /// Check the record invariants a full replacement must satisfy.
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.name, self.cost, self.price)
    }
}

/// Unit value used for inventory valuation.
///
/// Falls back from `cost` to `price` to `0`: a product with no (or zero)
/// acquisition cost is valued at its sale price. Totals that go through this
/// function therefore change when cost data is incomplete.
pub fn effective_unit_value(product: &Product) -> f64 {
    if product.cost > 0.0 {
        product.cost
    } else if product.price > 0.0 {
        product.price
    } else {
        0.0
    }
}

/// A not-yet-persisted product payload.
///
/// `id` and `created_at` are optional until [`ProductDraft::prepare`] assigns
/// them; the server may still override either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    pub category: String,
    pub location: String,
    pub unit: String,
    pub stock: u64,
    pub reorder_point: u64,
    pub cost: f64,
    pub price: f64,
    pub incoming: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category: category.into(),
            location: String::new(),
            unit: DEFAULT_UNIT.to_string(),
            stock: 0,
            reorder_point: 0,
            cost: 0.0,
            price: 0.0,
            incoming: 0,
            barcode: None,
            created_at: None,
        }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_stock(mut self, stock: u64, reorder_point: u64) -> Self {
        self.stock = stock;
        self.reorder_point = reorder_point;
        self
    }

    pub fn with_pricing(mut self, cost: f64, price: f64) -> Self {
        self.cost = cost;
        self.price = price;
        self
    }

    pub fn with_incoming(mut self, incoming: u64) -> Self {
        self.incoming = incoming;
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        let barcode = barcode.into();
        self.barcode = if barcode.trim().is_empty() { None } else { Some(barcode) };
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.name, self.cost, self.price)?;
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        Ok(())
    }

    /// Validate, then fill in `id` (derived from the name when absent) and
    /// `created_at`. An already assigned `created_at` is never overwritten.
    pub fn prepare(mut self, now: DateTime<Utc>) -> DomainResult<Self> {
        self.validate()?;
        if self.id.is_none() {
            self.id = Some(ProductId::from_name(&self.name)?);
        }
        self.created_at.get_or_insert(now);
        Ok(self)
    }

    /// Materialize the draft as a record, assigning `id`/`created_at` when missing.
    pub fn into_product(self, now: DateTime<Utc>) -> DomainResult<Product> {
        let draft = self.prepare(now)?;
        let id = match draft.id {
            Some(id) => id,
            None => ProductId::from_name(&draft.name)?,
        };
        Ok(Product {
            id,
            name: draft.name,
            category: draft.category,
            location: draft.location,
            unit: draft.unit,
            stock: draft.stock,
            reorder_point: draft.reorder_point,
            cost: draft.cost,
            price: draft.price,
            incoming: draft.incoming,
            barcode: draft.barcode,
            created_at: draft.created_at.unwrap_or(now),
        })
    }
}

fn validate_fields(name: &str, cost: f64, price: f64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(DomainError::validation("cost must be a non-negative number"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn product(stock: u64, reorder_point: u64, cost: f64, price: f64) -> Product {
        ProductDraft::new("Test Product", "Genel")
            .with_stock(stock, reorder_point)
            .with_pricing(cost, price)
            .into_product(test_time())
            .unwrap()
    }

    #[test]
    fn stock_level_classifies_against_reorder_point() {
        assert_eq!(product(0, 5, 1.0, 1.0).stock_level(), StockLevel::OutOfStock);
        assert_eq!(product(3, 5, 1.0, 1.0).stock_level(), StockLevel::Low);
        assert_eq!(product(5, 5, 1.0, 1.0).stock_level(), StockLevel::Low);
        assert_eq!(product(6, 5, 1.0, 1.0).stock_level(), StockLevel::Healthy);
        // a zero reorder point still flags empty shelves
        assert_eq!(product(0, 0, 1.0, 1.0).stock_level(), StockLevel::OutOfStock);
        assert!(product(0, 0, 1.0, 1.0).needs_reorder());
    }

    #[test]
    fn effective_unit_value_falls_back_from_cost_to_price_to_zero() {
        assert_eq!(effective_unit_value(&product(1, 0, 4.0, 9.0)), 4.0);
        assert_eq!(effective_unit_value(&product(1, 0, 0.0, 9.0)), 9.0);
        assert_eq!(effective_unit_value(&product(1, 0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn values_scale_with_stock() {
        let p = product(3, 10, 5.0, 8.0);
        assert_eq!(p.cost_value(), 15.0);
        assert_eq!(p.sale_value(), 24.0);
        assert_eq!(p.stock_value(), 15.0);
        assert_eq!(p.shortfall(), 7);
    }

    #[test]
    fn stock_after_refuses_to_go_negative() {
        let p = product(5, 2, 1.0, 1.0);
        assert_eq!(p.stock_after(-5), Some(0));
        assert_eq!(p.stock_after(-10), None);
        assert_eq!(p.stock_after(7), Some(12));
    }

    #[test]
    fn draft_rejects_empty_name_and_category() {
        let err = ProductDraft::new("  ", "Genel").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = ProductDraft::new("Kalem", "").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn draft_rejects_negative_or_non_finite_money() {
        let draft = ProductDraft::new("Kalem", "Kırtasiye").with_pricing(-1.0, 2.0);
        assert!(draft.validate().is_err());

        let draft = ProductDraft::new("Kalem", "Kırtasiye").with_pricing(1.0, f64::NAN);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn prepare_assigns_id_from_name_and_created_at_once() {
        let draft = ProductDraft::new("Omuz Çantası", "Çanta").prepare(test_time()).unwrap();
        assert_eq!(draft.id.as_ref().unwrap().as_str(), "omuz-cantasi");
        assert_eq!(draft.created_at, Some(test_time()));

        let later = test_time() + chrono::Duration::days(1);
        let again = draft.clone().prepare(later).unwrap();
        assert_eq!(again.created_at, Some(test_time()));
    }

    #[test]
    fn prepare_keeps_explicit_id() {
        let id = ProductId::new("SKU-42").unwrap();
        let draft = ProductDraft::new("Kalem", "Kırtasiye")
            .with_id(id.clone())
            .prepare(test_time())
            .unwrap();
        assert_eq!(draft.id, Some(id));
    }

    #[test]
    fn draft_defaults_unit_and_drops_blank_barcode() {
        let draft = ProductDraft::new("Kalem", "Kırtasiye").with_barcode("  ");
        assert_eq!(draft.unit, DEFAULT_UNIT);
        assert_eq!(draft.barcode, None);
    }

    #[test]
    fn product_serializes_camel_case_and_defaults_optional_fields() {
        let json = serde_json::json!({
            "id": "X",
            "name": "Kalem",
            "category": "Kırtasiye",
            "stock": 3,
            "reorderPoint": 10,
            "cost": 5,
            "price": 8,
            "createdAt": "2024-05-01T09:30:00Z"
        });
        let p: Product = serde_json::from_value(json).unwrap();
        assert_eq!(p.reorder_point, 10);
        assert_eq!(p.incoming, 0);
        assert_eq!(p.barcode, None);
        assert_eq!(p.created_at, test_time());

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["reorderPoint"], 10);
        assert!(back.get("barcode").is_none());
    }

    #[test]
    fn negative_stock_on_the_wire_is_rejected() {
        let json = serde_json::json!({
            "id": "X",
            "name": "Kalem",
            "stock": -1,
            "createdAt": "2024-05-01T09:30:00Z"
        });
        assert!(serde_json::from_value::<Product>(json).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every product is in exactly one stock level, and
            /// `needs_reorder` is exactly the critical levels.
            #[test]
            fn stock_level_partitions(stock in 0u64..1_000, rop in 0u64..1_000) {
                let p = product(stock, rop, 1.0, 1.0);
                let level = p.stock_level();
                prop_assert_eq!(level.is_critical(), p.needs_reorder());
                prop_assert_eq!(p.is_out_of_stock(), level == StockLevel::OutOfStock);
                prop_assert_eq!(p.is_low_stock(), level == StockLevel::Low);
            }

            /// Property: a valid delta followed by its negation restores stock.
            #[test]
            fn delta_round_trip(stock in 0u64..10_000, delta in -10_000i64..10_000) {
                let p = product(stock, 0, 1.0, 1.0);
                if let Some(next) = p.stock_after(delta) {
                    let mut q = p.clone();
                    q.stock = next;
                    prop_assert_eq!(q.stock_after(-delta), Some(stock));
                }
            }
        }
    }
}
