//! Aggregation engine: dashboard statistics and roll-ups.
//!
//! Every function here is pure and deterministic. Sums do not depend on input
//! order; rankings break ties by input order (stable sorts).
//!
//! Valuation goes through [`stockdash_products::effective_unit_value`], i.e. `cost`, falling back
//! to `price` when cost is zero. The strictly cost-based and price-based totals
//! are available separately as [`total_cost_value`] and [`total_sale_value`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stockdash_products::Product;

pub fn total_sku_count(products: &[Product]) -> usize {
    products.len()
}

pub fn total_stock_quantity(products: &[Product]) -> u64 {
    products.iter().map(|p| p.stock).sum()
}

/// `Σ stock * effective_unit_value` (cost, falling back to price).
pub fn total_inventory_value(products: &[Product]) -> f64 {
    products.iter().map(Product::stock_value).sum()
}

/// `Σ stock * cost`.
pub fn total_cost_value(products: &[Product]) -> f64 {
    products.iter().map(Product::cost_value).sum()
}

/// `Σ stock * price`.
pub fn total_sale_value(products: &[Product]) -> f64 {
    products.iter().map(Product::sale_value).sum()
}

/// `total_sale_value - total_cost_value`.
pub fn potential_profit(products: &[Product]) -> f64 {
    total_sale_value(products) - total_cost_value(products)
}

/// `potential_profit / total_cost_value`, or `0` when there is no cost basis.
pub fn profit_margin(products: &[Product]) -> f64 {
    margin(total_sale_value(products), total_cost_value(products))
}

fn margin(sale: f64, cost: f64) -> f64 {
    if cost == 0.0 { 0.0 } else { (sale - cost) / cost }
}

/// Products with `0 < stock <= reorder_point`.
pub fn low_stock_set(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

/// Products with `stock == 0`.
pub fn out_of_stock_set(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_out_of_stock()).collect()
}

/// `|low_stock_set| + |out_of_stock_set|` (the two sets are disjoint).
pub fn critical_count(products: &[Product]) -> usize {
    products.iter().filter(|p| p.needs_reorder()).count()
}

/// Mean unit price, `0` for an empty input.
pub fn average_price(products: &[Product]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(|p| p.price).sum::<f64>() / products.len() as f64
}

/// Scalar dashboard statistics, computed in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub sku_count: usize,
    pub total_stock: u64,
    pub inventory_value: f64,
    pub cost_value: f64,
    pub sale_value: f64,
    pub potential_profit: f64,
    pub margin: f64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub critical_count: usize,
    pub average_price: f64,
}

impl InventorySummary {
    pub fn compute(products: &[Product]) -> Self {
        let mut summary = Self {
            sku_count: products.len(),
            ..Self::default()
        };
        let mut price_sum = 0.0;

        for p in products {
            summary.total_stock += p.stock;
            summary.inventory_value += p.stock_value();
            summary.cost_value += p.cost_value();
            summary.sale_value += p.sale_value();
            price_sum += p.price;
            if p.is_out_of_stock() {
                summary.out_of_stock_count += 1;
            } else if p.is_low_stock() {
                summary.low_stock_count += 1;
            }
        }

        summary.critical_count = summary.low_stock_count + summary.out_of_stock_count;
        summary.potential_profit = summary.sale_value - summary.cost_value;
        summary.margin = margin(summary.sale_value, summary.cost_value);
        if !products.is_empty() {
            summary.average_price = price_sum / products.len() as f64;
        }
        summary
    }
}

/// The set of group keys a breakdown reports on.
///
/// `Fixed` keeps a configured list (and reports zero rows for empty groups);
/// `Derived` takes the distinct values present in the data, first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDomain {
    Fixed(Vec<String>),
    #[default]
    Derived,
}

impl GroupDomain {
    pub fn fixed<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupDomain::Fixed(keys.into_iter().map(Into::into).collect())
    }

    pub fn categories(&self, products: &[Product]) -> Vec<String> {
        self.resolve(products, |p| &p.category)
    }

    pub fn locations(&self, products: &[Product]) -> Vec<String> {
        self.resolve(products, |p| &p.location)
    }

    fn resolve(&self, products: &[Product], key: impl Fn(&Product) -> &String) -> Vec<String> {
        match self {
            GroupDomain::Fixed(keys) => keys.clone(),
            GroupDomain::Derived => distinct(products, key),
        }
    }
}

pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    distinct(products, |p| &p.category)
}

pub fn distinct_locations(products: &[Product]) -> Vec<String> {
    distinct(products, |p| &p.location)
}

fn distinct(products: &[Product], key: impl Fn(&Product) -> &String) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for product in products {
        let k = key(product);
        if !k.trim().is_empty() && seen.insert(k.as_str()) {
            keys.push(k.clone());
        }
    }
    keys
}

/// Roll-up of one category or location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBreakdown {
    pub key: String,
    pub items: usize,
    pub quantity: u64,
    pub value: f64,
    pub low_stock: usize,
    pub shortfall: u64,
}

impl GroupBreakdown {
    fn empty(key: String) -> Self {
        Self {
            key,
            items: 0,
            quantity: 0,
            value: 0.0,
            low_stock: 0,
            shortfall: 0,
        }
    }

    fn add(&mut self, product: &Product) {
        self.items += 1;
        self.quantity += product.stock;
        self.value += product.stock_value();
        self.shortfall += product.shortfall();
        if product.is_low_stock() {
            self.low_stock += 1;
        }
    }
}

/// One row per entry of `categories`, in that order, zero rows included.
/// Products whose category is not listed are not counted.
pub fn category_breakdown(products: &[Product], categories: &[String]) -> Vec<GroupBreakdown> {
    breakdown(products, categories, |p| &p.category)
}

/// One row per entry of `locations`, in that order, zero rows included.
pub fn location_breakdown(products: &[Product], locations: &[String]) -> Vec<GroupBreakdown> {
    breakdown(products, locations, |p| &p.location)
}

fn breakdown(
    products: &[Product],
    keys: &[String],
    key_of: impl Fn(&Product) -> &String,
) -> Vec<GroupBreakdown> {
    let mut rows: Vec<GroupBreakdown> = keys.iter().cloned().map(GroupBreakdown::empty).collect();
    for product in products {
        let key = key_of(product);
        // a key listed twice only accumulates into its first row
        if let Some(row) = rows.iter_mut().find(|row| row.key == *key) {
            row.add(product);
        }
    }
    rows
}

/// Item count per category, largest first; ties keep `categories` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub name: String,
    pub value: usize,
}

pub fn category_shares(products: &[Product], categories: &[String]) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = category_breakdown(products, categories)
        .into_iter()
        .map(|row| CategoryShare {
            name: row.key,
            value: row.items,
        })
        .collect();
    shares.sort_by(|a, b| b.value.cmp(&a.value));
    shares
}

/// Top `n` by `stock * (cost || price || 0)`, descending.
pub fn top_value_items(products: &[Product], n: usize) -> Vec<&Product> {
    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| b.stock_value().total_cmp(&a.stock_value()));
    ranked.truncate(n);
    ranked
}

/// Top `n` by stock, descending.
pub fn top_stock_items(products: &[Product], n: usize) -> Vec<&Product> {
    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| b.stock.cmp(&a.stock));
    ranked.truncate(n);
    ranked
}

/// Critical products with the least stock first, at most `n`.
pub fn lowest_stock_items(products: &[Product], n: usize) -> Vec<&Product> {
    let mut ranked: Vec<&Product> = products.iter().filter(|p| p.needs_reorder()).collect();
    ranked.sort_by_key(|p| p.stock);
    ranked.truncate(n);
    ranked
}

/// Most recently created first, at most `n`.
pub fn recent_items(products: &[Product], n: usize) -> Vec<&Product> {
    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    ranked.truncate(n);
    ranked
}
