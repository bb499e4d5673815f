//! Text rendering utilities for bean names and diagnostics.
//!
//! Provides helpers to derive simple type names, suggest close
//! registry keys on a lookup miss, and render the registry as a table.

/// Shortens a fully qualified type name for display.
///
/// Every path component is reduced to its last segment, including the
/// ones nested inside generic arguments.
///
/// ```
/// use khazna_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Returns the unqualified name of a type, as used for registry keys.
///
/// Trait objects lose their `dyn` keyword and any auto-trait bounds, so a
/// field declared as `Autowired<dyn bank::AccountDao + Send + Sync>` is keyed
/// by `AccountDao`.
///
/// ```
/// use khazna_support::rendering::simple_type_name;
///
/// assert_eq!(simple_type_name("bank::dao::JdbcAccountDao"), "JdbcAccountDao");
/// assert_eq!(
///     simple_type_name("dyn bank::AccountDao + core::marker::Send + core::marker::Sync"),
///     "AccountDao"
/// );
/// ```
pub fn simple_type_name(full_name: &str) -> String {
    let trimmed = full_name.trim();
    let without_dyn = trimmed.strip_prefix("dyn ").unwrap_or(trimmed);
    let principal = top_level_principal(without_dyn);
    shorten_type_name(principal.trim())
}

// Cuts `A<B + C> + Send` down to `A<B + C>`; bounds inside generics stay.
fn top_level_principal(name: &str) -> &str {
    let mut depth = 0usize;
    for (idx, ch) in name.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => return &name[..idx],
            _ => {}
        }
    }
    name
}

/// Generates "did you mean?" suggestions for a missed registry key.
///
/// Keys that differ only by case rank first, then substring matches,
/// then keys sharing a prefix of at least three characters.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();

            if name_lower == requested_lower {
                return Some((name, 200));
            }

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// One line of a rendered registry table.
#[derive(Debug)]
pub struct BeanRow {
    /// Registry key
    pub key: String,
    /// Bean kind, e.g. "Instance" or "InterfaceProxy"
    pub kind: String,
    /// Fully qualified name of the registered type
    pub type_name: String,
}

/// Renders registry rows as an aligned table, sorted by key.
///
/// ```text
/// [Instance      ] accountDao      (bank::JdbcAccountDao)
/// [InterfaceProxy] transferService (bank::TransferServiceImpl)
/// ```
pub fn render_bean_table(rows: &[BeanRow]) -> String {
    let kind_width = rows.iter().map(|r| r.kind.len()).max().unwrap_or(0);
    let key_width = rows.iter().map(|r| r.key.len()).max().unwrap_or(0);

    let mut sorted: Vec<&BeanRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let mut result = String::new();
    for row in sorted {
        result.push_str(&format!(
            "[{:<kind_width$}] {:<key_width$} ({})\n",
            row.kind, row.key, row.type_name,
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_simple_path() {
        assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn simple_name_of_trait_object() {
        assert_eq!(simple_type_name("dyn bank::AccountDao"), "AccountDao");
        assert_eq!(
            simple_type_name("dyn bank::AccountDao + core::marker::Send + core::marker::Sync"),
            "AccountDao"
        );
    }

    #[test]
    fn simple_name_keeps_generic_bounds() {
        assert_eq!(
            simple_type_name("bank::Holder<dyn bank::Dao + core::marker::Send>"),
            "Holder<dyn Dao + Send>"
        );
    }

    #[test]
    fn simple_name_matches_type_name_output() {
        struct ServiceBImpl;
        assert_eq!(simple_type_name(std::any::type_name::<ServiceBImpl>()), "ServiceBImpl");
    }

    #[test]
    fn suggest_case_mismatch_first() {
        let available = vec!["accountDao", "AccountDaoMock", "transferService"];
        let suggestions = suggest_similar("AccountDao", &available, 3);
        assert_eq!(suggestions[0], "accountDao");
        assert!(suggestions.contains(&"AccountDaoMock".to_string()));
        assert!(!suggestions.contains(&"transferService".to_string()));
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["accountDao"];
        assert!(suggest_similar("XyzAbcDef", &available, 3).is_empty());
    }

    #[test]
    fn suggest_skips_exact_key() {
        let available = vec!["proxyFactory"];
        assert!(suggest_similar("proxyFactory", &available, 3).is_empty());
    }

    #[test]
    fn bean_table_is_aligned_and_sorted() {
        let rows = vec![
            BeanRow {
                key: "transferService".to_string(),
                kind: "InterfaceProxy".to_string(),
                type_name: "bank::TransferServiceImpl".to_string(),
            },
            BeanRow {
                key: "accountDao".to_string(),
                kind: "Instance".to_string(),
                type_name: "bank::JdbcAccountDao".to_string(),
            },
        ];

        let rendered = render_bean_table(&rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[Instance      ] accountDao      (bank::JdbcAccountDao)");
        assert_eq!(lines[1], "[InterfaceProxy] transferService (bank::TransferServiceImpl)");
    }

    #[test]
    fn empty_table() {
        assert_eq!(render_bean_table(&[]), "");
    }
}
