//! Shop-page filters over a fetched catalog.
//!
//! Price buckets and occasions are the choices offered by the storefront's
//! filter panel. Occasions map onto category names, matched as
//! case-insensitive substrings.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use lima_rose_core::{Catalog, Product};

/// How many related products a product page shows.
pub const DEFAULT_RELATED_LIMIT: usize = 4;

/// Unrecognised filter value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct FilterError {
    kind: &'static str,
    value: String,
}

/// Price bucket in soles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceRange {
    /// 0 to 100 inclusive.
    UpTo100,
    /// Above 100, up to 200.
    From100To200,
    /// Above 200, up to 300.
    From200To300,
    /// Above 300.
    Over300,
}

impl PriceRange {
    pub const ALL: [Self; 4] = [
        Self::UpTo100,
        Self::From100To200,
        Self::From200To300,
        Self::Over300,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpTo100 => "0-100",
            Self::From100To200 => "100-200",
            Self::From200To300 => "200-300",
            Self::Over300 => "300+",
        }
    }

    /// Lower bounds are exclusive except for the first bucket.
    #[must_use]
    pub fn contains(self, price: Decimal) -> bool {
        let (low, high) = match self {
            Self::UpTo100 => return price >= Decimal::ZERO && price <= Decimal::ONE_HUNDRED,
            Self::From100To200 => (100, Some(200)),
            Self::From200To300 => (200, Some(300)),
            Self::Over300 => (300, None),
        };
        price > Decimal::from(low) && high.is_none_or(|high| price <= Decimal::from(high))
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|range| range.as_str() == s)
            .ok_or_else(|| FilterError {
                kind: "price range",
                value: s.to_string(),
            })
    }
}

/// Occasion a customer is shopping for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occasion {
    Amor,
    Cumpleanos,
    Matrimonios,
    Condolencias,
    Eventos,
}

impl Occasion {
    pub const ALL: [Self; 5] = [
        Self::Amor,
        Self::Cumpleanos,
        Self::Matrimonios,
        Self::Condolencias,
        Self::Eventos,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amor => "amor",
            Self::Cumpleanos => "cumpleaños",
            Self::Matrimonios => "matrimonios",
            Self::Condolencias => "condolencias",
            Self::Eventos => "eventos",
        }
    }

    /// Category names that suit the occasion.
    #[must_use]
    pub const fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Amor => &["ramos", "cajas"],
            Self::Cumpleanos => &["ramos", "mini ramos", "postres"],
            Self::Matrimonios => &["matrimonios", "ramos"],
            Self::Condolencias => &["condolencias", "ramos"],
            Self::Eventos => &["eventos", "cajas", "barriles"],
        }
    }

    #[must_use]
    pub fn matches(self, product: &Product) -> bool {
        let category = product.category.to_lowercase();
        self.categories().iter().any(|c| category.contains(c))
    }
}

impl fmt::Display for Occasion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Occasion {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        // Accept the unaccented spelling too.
        let s = if s == "cumpleanos" { "cumpleaños".to_string() } else { s };
        Self::ALL
            .into_iter()
            .find(|occasion| occasion.as_str() == s)
            .ok_or(FilterError {
                kind: "occasion",
                value: s,
            })
    }
}

/// Products whose price falls in `range`.
#[must_use]
pub fn by_price_range(catalog: &Catalog, range: PriceRange) -> Vec<Product> {
    catalog
        .iter()
        .map(|(_, p)| p)
        .filter(|p| range.contains(p.price))
        .cloned()
        .collect()
}

/// Products whose category suits `occasion`.
#[must_use]
pub fn by_occasion(catalog: &Catalog, occasion: Occasion) -> Vec<Product> {
    catalog
        .iter()
        .map(|(_, p)| p)
        .filter(|p| occasion.matches(p))
        .cloned()
        .collect()
}

/// Up to `limit` products to show next to `product`.
///
/// Products of the same category come first, where a category also counts
/// as the same when it contains the first word of `product`'s category.
/// Remaining slots are filled with other products in catalog order.
/// `product` itself is never included.
#[must_use]
pub fn related(catalog: &Catalog, product: &Product, limit: usize) -> Vec<Product> {
    let category = product.category.to_lowercase();
    let first_word = category.split_whitespace().next().unwrap_or_default();
    let same_category = |p: &Product| {
        p.category == product.category
            || (!first_word.is_empty() && p.category.to_lowercase().contains(first_word))
    };

    let others = || catalog.iter().map(|(_, p)| p).filter(|p| p.id != product.id);
    others()
        .filter(|p| same_category(p))
        .chain(others().filter(|p| !same_category(p)))
        .take(limit)
        .cloned()
        .collect()
}
