//! URL slug derivation and collision suffixing.
//!
//! A base slug is derived from the display name (lowercase ASCII,
//! hyphen-separated, everything else stripped). If the base is taken by a
//! different entity, `-1`, `-2`, ... are appended until a free slug is
//! found; the entity's own ID is excluded so re-saving an unchanged name
//! never self-collides.

use voltshop_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;

/// Derive a URL-safe base slug from a display name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
        // any other punctuation is stripped outright
    }

    slug
}

/// Derive a slug for a product name that is unique across products.
///
/// Runs on create and on every rename. `exclude` carries the product's own
/// ID on rename.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a uniqueness probe fails.
pub async fn unique_product_slug(
    repo: &ProductRepository<'_>,
    name: &str,
    exclude: Option<ProductId>,
) -> Result<String, RepositoryError> {
    let base = slugify(name);
    let mut slug = base.clone();
    let mut count = 1;

    while repo.slug_exists(&slug, exclude).await? {
        slug = format!("{base}-{count}");
        count += 1;
    }

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Solar Inverter 3kW"), "solar-inverter-3kw");
    }

    #[test]
    fn test_slugify_collapses_separator_runs() {
        assert_eq!(slugify("  Deep  -  Cycle   Battery "), "deep-cycle-battery");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("Ampere's \"Best\" Panel!"), "amperes-best-panel");
    }

    #[test]
    fn test_slugify_non_ascii_dropped() {
        assert_eq!(slugify("Café Résistance 12V"), "caf-rsistance-12v");
    }

    #[test]
    fn test_slugify_no_leading_or_trailing_hyphen() {
        assert_eq!(slugify("--- hello ---"), "hello");
        assert_eq!(slugify("!!!"), "");
    }
}
