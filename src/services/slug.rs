use sqlx::SqlitePool;

use crate::database::brewery_repo;

/// Lowercase-hyphenated form of a display name: ascii alphanumerics kept,
/// every other run of characters collapsed to a single hyphen, no leading or
/// trailing hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut prev_dash = false;
    for ch in name.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash && !slug.is_empty() {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Base used when a name contains no ascii alphanumerics at all, so the slug
/// never comes out empty or as a bare `-1`.
const FALLBACK_BASE: &str = "brouwerij";

/// Derives a slug for `name`, appending `-1`, `-2`, ... until an unused one
/// is found. Check-then-insert is racy between concurrent creates; the
/// unique index on breweries.slug is the backstop and a lost race surfaces
/// as the insert error.
pub async fn unique_slug(pool: &SqlitePool, name: &str) -> sqlx::Result<String> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = FALLBACK_BASE.to_string();
    }
    if !brewery_repo::slug_exists(pool, &base).await? {
        return Ok(base);
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !brewery_repo::slug_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("River Brew"), "river-brew");
        assert_eq!(slugify("De 3 Horne"), "de-3-horne");
    }

    #[test]
    fn slugify_collapses_separator_runs() {
        assert_eq!(slugify("Oak  &  Pine"), "oak-pine");
        assert_eq!(slugify("  Hop / Stad  "), "hop-stad");
    }

    #[test]
    fn slugify_strips_edge_hyphens() {
        assert_eq!(slugify("'t Veem"), "t-veem");
        assert_eq!(slugify("Brouwerij!"), "brouwerij");
    }

    #[test]
    fn slugify_is_empty_without_ascii_alphanumerics() {
        assert_eq!(slugify("???"), "");
        assert_eq!(slugify("øl & bær"), "l-b-r");
        assert_eq!(slugify("醸造所"), "");
    }
}
