//! Directory listing synthesis module
//!
//! Archives carry a flat namespace of entry names; directories are inferred
//! at request time. For a directory prefix, every entry name starting with
//! the prefix contributes its remainder up to and including the next slash
//! (or to the end of the name). Collecting those remainders into an ordered
//! set yields the immediate children, deduplicated and sorted.

use std::collections::BTreeSet;

/// Compute the immediate child names of a directory prefix.
///
/// A child ending in `/` is an inferred subdirectory; anything else is a
/// file. The set is lexicographically ordered and independent of entry
/// enumeration order.
pub fn child_names<'a, I>(entry_names: I, dir: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut children = BTreeSet::new();
    for name in entry_names {
        if let Some(rest) = name.strip_prefix(dir) {
            let child = match rest.find('/') {
                Some(slash) => &rest[..=slash],
                None => rest,
            };
            children.insert(child.to_string());
        }
    }
    children
}

/// Append `text` to `out` with the HTML-significant characters escaped
pub fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Render a directory listing page for the given child set
pub fn render_listing(children: &BTreeSet<String>) -> String {
    let mut page = String::from("<html><head><title>Directory List</title></head><body><hr>\n");
    page.push_str("<a href='..'>..</a><br>\n");
    for child in children {
        page.push_str("<a href='./");
        push_escaped(&mut page, child);
        page.push_str("'>");
        push_escaped(&mut page, child);
        page.push_str("</a><br>\n");
    }
    if children.is_empty() {
        page.push_str("Archive does not have any contents in this directory");
    }
    page.push_str("<hr></body></html>");
    page
}

/// Render the root index page listing all mount names
pub fn render_root_index(mounts: &[String]) -> String {
    let mut page =
        String::from("<html><head><title>Archives on zipserve</title></head><body><hr>\n");
    if mounts.is_empty() {
        page.push_str("No archives mounted");
    }
    for name in mounts {
        page.push_str("<a href='");
        push_escaped(&mut page, name);
        page.push_str("/'>");
        push_escaped(&mut page, name);
        page.push_str("</a><br>\n");
    }
    page.push_str("<hr></body></html>");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<&'static str> {
        vec![
            "readme.txt",
            "docs/",
            "docs/guide.md",
            "docs/api/index.html",
            "src/main.rs",
            "src/lib.rs",
        ]
    }

    #[test]
    fn test_root_children() {
        let children = child_names(names(), "");
        let expected: Vec<&str> = vec!["docs/", "readme.txt", "src/"];
        assert_eq!(children.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_subdirectory_children() {
        let children = child_names(names(), "docs/");
        // "docs/" itself contributes its empty remainder, which is kept
        let expected: Vec<&str> = vec!["", "api/", "guide.md"];
        assert_eq!(children.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_children_deduplicate_shared_parent() {
        let children = child_names(names(), "src/");
        assert_eq!(children.len(), 2);
        assert!(children.contains("main.rs"));
        assert!(children.contains("lib.rs"));
    }

    #[test]
    fn test_children_order_independent_of_input_order() {
        let forward = child_names(names(), "");
        let mut reversed = names();
        reversed.reverse();
        let backward = child_names(reversed, "");
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_unmatched_prefix_is_empty() {
        let children = child_names(names(), "missing/");
        assert!(children.is_empty());
    }

    #[test]
    fn test_escape_all_significant_characters() {
        let mut out = String::new();
        push_escaped(&mut out, "a&b<c>.txt");
        assert_eq!(out, "a&amp;b&lt;c&gt;.txt");

        let mut out = String::new();
        push_escaped(&mut out, r#"he said "it's""#);
        assert_eq!(out, "he said &quot;it&#39;s&quot;");
    }

    #[test]
    fn test_render_listing_escapes_names() {
        let mut children = BTreeSet::new();
        children.insert("a&b<c>.txt".to_string());
        let page = render_listing(&children);
        assert!(page.contains("a&amp;b&lt;c&gt;.txt"));
        assert!(!page.contains("a&b<c>.txt"));
    }

    #[test]
    fn test_render_listing_empty_placeholder() {
        let page = render_listing(&BTreeSet::new());
        assert!(page.contains("Archive does not have any contents in this directory"));
        assert!(!page.contains("<a href='./"));
        // Parent link is always present
        assert!(page.contains("<a href='..'>..</a>"));
    }

    #[test]
    fn test_render_root_index() {
        let page = render_root_index(&["alpha".to_string(), "beta".to_string()]);
        assert!(page.contains("<a href='alpha/'>alpha</a>"));
        assert!(page.contains("<a href='beta/'>beta</a>"));

        let empty = render_root_index(&[]);
        assert!(empty.contains("No archives mounted"));
    }
}
