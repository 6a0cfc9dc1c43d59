//! Test fixtures shared by the unit tests of this crate.

use chrono::{DateTime, TimeZone, Utc};

use stockdash_core::ProductId;
use stockdash_products::Product;

/// Midnight of 2024-01-`day`.
pub(crate) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub(crate) fn product(id: &str, stock: u64, reorder_point: u64) -> Product {
    priced(id, stock, reorder_point, 1.0, 2.0)
}

pub(crate) fn priced(id: &str, stock: u64, reorder_point: u64, cost: f64, price: f64) -> Product {
    Product {
        id: ProductId::new(id).unwrap(),
        name: format!("Product {id}"),
        category: "Genel".to_string(),
        location: String::new(),
        unit: "Adet".to_string(),
        stock,
        reorder_point,
        cost,
        price,
        incoming: 0,
        barcode: None,
        created_at: at(1),
    }
}
