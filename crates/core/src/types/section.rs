//! Catalog sections (the storefront's "filters").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named product bucket on the storefront.
///
/// Declaration order is the order sections appear in catalog listings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// The main catalog.
    #[default]
    Products,
    /// Discounted products.
    Ofertas,
    /// Best sellers.
    Vendidos,
    /// Seasonal and special-occasion arrangements.
    Especiales,
    /// Legacy "featured" bucket from the first storefront.
    Destacados,
}

impl Section {
    /// Sections that always exist in a catalog, even when empty.
    pub const CANONICAL: [Self; 4] = [
        Self::Products,
        Self::Ofertas,
        Self::Vendidos,
        Self::Especiales,
    ];

    /// Wire name of the section.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Ofertas => "ofertas",
            Self::Vendidos => "vendidos",
            Self::Especiales => "especiales",
            Self::Destacados => "destacados",
        }
    }

    /// Whether the section is always present in listings.
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        !matches!(self, Self::Destacados)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown section name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section: {0}")]
pub struct SectionError(pub String);

impl FromStr for Section {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "products" => Ok(Self::Products),
            "ofertas" => Ok(Self::Ofertas),
            "vendidos" => Ok(Self::Vendidos),
            "especiales" => Ok(Self::Especiales),
            "destacados" => Ok(Self::Destacados),
            _ => Err(SectionError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_section_from_str_is_case_insensitive() {
        assert_eq!("Ofertas".parse::<Section>().unwrap(), Section::Ofertas);
        assert_eq!(" vendidos ".parse::<Section>().unwrap(), Section::Vendidos);
    }

    #[test]
    fn test_section_from_str_rejects_unknown() {
        let err = "novedades".parse::<Section>().unwrap_err();
        assert_eq!(err.to_string(), "unknown section: novedades");
    }

    #[test]
    fn test_section_serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&Section::Especiales).unwrap(),
            "\"especiales\""
        );
        let section: Section = serde_json::from_str("\"destacados\"").unwrap();
        assert_eq!(section, Section::Destacados);
    }

    #[test]
    fn test_only_destacados_is_not_canonical() {
        assert!(Section::CANONICAL.iter().all(|s| s.is_canonical()));
        assert!(!Section::Destacados.is_canonical());
    }
}
