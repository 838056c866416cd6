// src/crawl/emails.rs
// =============================================================================
// This module pulls email-like tokens out of raw page text.
//
// We match against the HTML source, not the rendered page, so addresses
// inside attributes, comments and <script> blocks are found too. There is no
// validation beyond the syntactic shape:
//
//   local-part  @  domain  .  tld
//   [a-z0-9.-+]+   [a-z0-9.-+]+ [a-z]+     (case-insensitive)
//
// Matches are stored exactly as found. "Foo@x.com" and "foo@x.com" are two
// different entries.
// =============================================================================

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9.\-+]+@[a-z0-9.\-+]+\.[a-z]+").expect("email pattern is valid")
});

// Extracts every distinct email-like token from a page body
//
// BTreeSet keeps the result sorted, which is the order we print and save in.
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_double_at() {
        let emails = extract_emails("contact us at Foo.Bar+test@example.com or bad-email@@x");
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("Foo.Bar+test@example.com"));
    }

    #[test]
    fn test_keeps_case_variants_distinct() {
        let emails = extract_emails("Info@Example.com info@example.com info@example.com");
        assert_eq!(emails.len(), 2);
        assert!(emails.contains("Info@Example.com"));
        assert!(emails.contains("info@example.com"));
    }

    #[test]
    fn test_matches_inside_markup() {
        let html = r#"<a href="mailto:sales@shop.co.uk">Sales</a>
            <!-- old: admin@shop.co.uk -->
            <script>var e = "js-user@cdn.shop.io";</script>"#;
        let emails = extract_emails(html);
        assert!(emails.contains("sales@shop.co.uk"));
        assert!(emails.contains("admin@shop.co.uk"));
        assert!(emails.contains("js-user@cdn.shop.io"));
    }

    #[test]
    fn test_requires_letter_tld() {
        assert!(extract_emails("user@host.123").is_empty());
        assert!(extract_emails("user@localhost").is_empty());
    }

    #[test]
    fn test_extraction_is_pure() {
        let text = "a@b.com, c.d@e.org and again a@b.com";
        assert_eq!(extract_emails(text), extract_emails(text));
    }

    #[test]
    fn test_every_match_fits_pattern() {
        let text = "x <y@z.net> q+1@w.io; not-an-email @ nothing.com";
        for email in extract_emails(text) {
            assert!(EMAIL_PATTERN.find(&email).map(|m| m.as_str()) == Some(email.as_str()));
        }
    }
}
