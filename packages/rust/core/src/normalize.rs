//! Field-name canonicalization for fuzzy comparison.
//!
//! `normalize` folds the cosmetic differences seen between our preferred
//! field names and what operators actually type into the CRM: case,
//! punctuation, unicode dashes and quotes, and whitespace.

use std::sync::LazyLock;

use regex::Regex;

/// Matches runs of spaces left after character filtering.
static SPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("space run regex"));

/// Canonical comparison key for a field display name. Pure, total, idempotent.
pub fn normalize(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());

    for c in name.chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            // hyphen, non-breaking hyphen, figure dash, en dash, em dash,
            // horizontal bar, minus sign
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{2018}'..='\u{201F}' | '\u{2032}' | '\u{2033}' | '`' | '"' => '\'',
            c if c.is_whitespace() => ' ',
            c => c,
        };

        if matches!(mapped, 'a'..='z' | '0'..='9' | ' ' | '-' | '_') {
            folded.push(mapped);
        }
    }

    SPACE_RUN_RE.replace_all(folded.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  Business Type  "), "business type");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("Lead \t  Quality\nTier"), "lead quality tier");
    }

    #[test]
    fn maps_unicode_dashes() {
        assert_eq!(normalize("Monthly Budget \u{2014} USD"), "monthly budget - usd");
        assert_eq!(normalize("Monthly Budget \u{2013} USD"), "monthly budget - usd");
        assert_eq!(normalize("Monthly Budget - USD"), "monthly budget - usd");
    }

    #[test]
    fn strips_quotes_and_punctuation() {
        assert_eq!(normalize("Owner\u{2019}s Name:"), "owners name");
        assert_eq!(normalize("Owner's Name"), "owners name");
        assert_eq!(normalize("What's your #1 goal?"), "whats your 1 goal");
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(normalize("utm_source 2"), "utm_source 2");
    }

    #[test]
    fn punctuation_between_words_does_not_leave_double_spaces() {
        assert_eq!(normalize("Budget / Month"), "budget month");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(normalize("Café Größe"), "caf gre");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!*"), "");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "  Business  Type:  ",
            "Monthly Budget \u{2014} USD",
            "\u{201C}Quoted\u{201D} \u{2018}Name\u{2019}",
            "MiXeD_case-Key  99",
            "Café Größe",
            "a ! b",
            "",
            "\u{2212}\u{2212}",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }
}
