//! Product identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a product.
///
/// Either assigned by the server or derived client-side from the product name
/// (see [`ProductId::from_name`]). Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Wrap an existing identifier. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("product id cannot be empty"));
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Time-ordered random identifier (UUIDv7), for stores that assign ids.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Derive a URL-safe slug from a product name.
    ///
    /// Turkish letters are folded to ASCII, every other non-alphanumeric run
    /// collapses to a single `-`. Fails when nothing usable remains.
    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;

        for ch in name.chars().flat_map(char::to_lowercase) {
            let folded = match ch {
                'ç' => 'c',
                'ğ' => 'g',
                'ı' => 'i',
                'ö' => 'o',
                'ş' => 's',
                'ü' => 'u',
                'â' => 'a',
                'î' => 'i',
                'û' => 'u',
                other => other,
            };

            if folded.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(folded);
            } else {
                // combining marks produced by lowercasing (e.g. 'İ') are dropped
                if !is_combining_mark(folded) {
                    pending_dash = true;
                }
            }
        }

        if slug.is_empty() {
            return Err(DomainError::invalid_id(format!(
                "cannot derive a product id from name {name:?}"
            )));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&ch)
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductId> for String {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_blank_ids() {
        assert!(ProductId::new("").is_err());
        assert!(ProductId::new("   ").is_err());
        assert_eq!(ProductId::new("  sku-1 ").unwrap().as_str(), "sku-1");
    }

    #[test]
    fn from_name_folds_turkish_letters() {
        let id = ProductId::from_name("Omuz Çantası").unwrap();
        assert_eq!(id.as_str(), "omuz-cantasi");

        let id = ProductId::from_name("  Şeker / Küp (1kg) ").unwrap();
        assert_eq!(id.as_str(), "seker-kup-1kg");
    }

    #[test]
    fn from_name_drops_dotted_capital_i_mark() {
        let id = ProductId::from_name("İplik").unwrap();
        assert_eq!(id.as_str(), "iplik");
    }

    #[test]
    fn from_name_rejects_names_without_alphanumerics() {
        let err = ProductId::from_name(" -- ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ProductId::generate(), ProductId::generate());
    }

    #[test]
    fn serde_is_transparent_and_validates() {
        let id: ProductId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: derived slugs only contain lowercase ASCII, digits and single dashes.
            #[test]
            fn derived_slug_is_url_safe(name in "[A-Za-zÇçĞğÖöŞşÜü0-9 ,./-]{1,40}") {
                if let Ok(id) = ProductId::from_name(&name) {
                    let s = id.as_str();
                    prop_assert!(s.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-')));
                    prop_assert!(!s.starts_with('-') && !s.ends_with('-'));
                    prop_assert!(!s.contains("--"));
                }
            }
        }
    }
}
