//! Filter engine: the visible subset of the collection.

use serde::{Deserialize, Serialize};

use stockdash_products::Product;

/// Labels accepted as the "every category" selector.
const ALL_SENTINELS: [&str; 3] = ["all", "hepsi", "tümü"];

/// Category selector of the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelector {
    #[default]
    All,
    Named(String),
}

impl CategorySelector {
    /// Parse a selector label. Empty input and the "all"/"Hepsi" sentinels
    /// (case-insensitive) select every category.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        let lowered = trimmed.to_lowercase();
        if trimmed.is_empty() || ALL_SENTINELS.contains(&lowered.as_str()) {
            CategorySelector::All
        } else {
            CategorySelector::Named(trimmed.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Named(name) => name == category,
        }
    }

    /// Category name to send upstream, `None` for the "all" selector.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            CategorySelector::All => None,
            CategorySelector::Named(name) => Some(name),
        }
    }
}

/// Search state of the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub query: String,
    pub category: CategorySelector,
    pub only_low: bool,
}

impl ProductFilter {
    pub fn new(query: impl Into<String>, category: CategorySelector, only_low: bool) -> Self {
        Self {
            query: query.into(),
            category,
            only_low,
        }
    }

    /// Whether every product passes (empty query, all categories, no low-only).
    pub fn is_neutral(&self) -> bool {
        self.query.is_empty() && self.category == CategorySelector::All && !self.only_low
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_with(product, &self.needle())
    }

    /// Apply the filter, preserving input order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let needle = self.needle();
        products
            .iter()
            .filter(|p| self.matches_with(p, &needle))
            .collect()
    }

    fn needle(&self) -> String {
        self.query.to_lowercase()
    }

    fn matches_with(&self, product: &Product, needle: &str) -> bool {
        matches_query(product, needle)
            && self.category.matches(&product.category)
            && (!self.only_low || product.needs_reorder())
    }
}

/// `filter(products, query, category, only_low)` in one call.
pub fn filter_products<'a>(
    products: &'a [Product],
    query: &str,
    category: &CategorySelector,
    only_low: bool,
) -> Vec<&'a Product> {
    ProductFilter::new(query, category.clone(), only_low).apply(products)
}

/// Case-insensitive substring match on id, name, category and location.
/// `needle` must already be lowercased; empty matches everything.
fn matches_query(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        product.id.as_str(),
        product.name.as_str(),
        product.category.as_str(),
        product.location.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
