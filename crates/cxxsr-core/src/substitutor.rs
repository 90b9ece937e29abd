//! Positional replay of identifier substitutions.
//!
//! A mangled name is rewritten by walking its token list left to right with a
//! cursor. Each token's `<length><identifier>` field is located at or after
//! the cursor and, unless reserved, replaced by the substitute's own
//! length-prefixed form. The cursor then moves past the replacement, so
//! repeated identifiers and identifiers that are prefixes of one another each
//! land on their own occurrence.
//!
//! Tokens that carry the offset the parser read them at are spliced exactly
//! there, shifted by the length change of earlier replacements. Text such as
//! `S2_m` can look like a field (`2_m`) without being one, so a search is
//! only used for tokens without an offset.

use cxxsr_demangle::Token;

use crate::allocator::RenameTable;
use crate::collector::is_renameable;
use crate::error::RewriteError;

/// A rewritten mangled name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten text. Partially rewritten when `error` is set.
    pub text: String,
    /// Why substitution stopped early, if it did.
    pub error: Option<RewriteError>,
}

impl Rewrite {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Rewrite `mangled` by substituting each token occurrence in order.
pub fn rewrite(mangled: &str, tokens: &[Token], table: &RenameTable) -> Rewrite {
    let mut text = mangled.to_string();
    let mut cursor = 0;

    for token in tokens {
        let envelope = token.envelope();
        let Some(start) = locate(&text, mangled.len(), cursor, token, &envelope) else {
            return Rewrite {
                text,
                error: Some(RewriteError::TokenNotFound {
                    token: token.text.clone(),
                    offset: cursor,
                }),
            };
        };
        let end = start + envelope.len();

        if !is_renameable(token) {
            cursor = end;
            continue;
        }

        let Some(replacement) = table.encoded(&token.text) else {
            return Rewrite {
                text,
                error: Some(RewriteError::Unmapped {
                    token: token.text.clone(),
                }),
            };
        };
        text.replace_range(start..end, &replacement);
        cursor = start + replacement.len();
    }

    Rewrite { text, error: None }
}

/// Position of `token`'s field in the partially rewritten `text`.
///
/// Every earlier replacement lies before the field, so the shift is the
/// difference between the current and the original length.
fn locate(
    text: &str,
    original_len: usize,
    cursor: usize,
    token: &Token,
    envelope: &str,
) -> Option<usize> {
    match token.offset {
        Some(offset) => {
            let start = (offset + text.len()).checked_sub(original_len)?;
            let present = start >= cursor && text.get(start..)?.starts_with(envelope);
            present.then_some(start)
        }
        None => find_envelope(text, cursor, envelope),
    }
}

/// Locate a length-prefixed field at or after `from`.
///
/// A match must start at `from` or right after a non-digit byte; otherwise it
/// would be the tail of a longer length field (`3foo` inside `13foo…`).
fn find_envelope(text: &str, from: usize, envelope: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let haystack = text.get(from..)?;

    haystack
        .match_indices(envelope)
        .map(|(offset, _)| from + offset)
        .find(|&start| start == from || !bytes[start - 1].is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> RenameTable {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts.iter().map(|t| Token::new(*t)).collect()
    }

    #[test]
    fn test_single_identifier() {
        let result = rewrite("_Z3fooi", &tokens(&["foo"]), &table(&[("foo", "CXXSR_2a")]));
        assert_eq!(result.text, "_Z8CXXSR_2ai");
        assert!(result.is_complete());
    }

    #[test]
    fn test_repeated_identifier() {
        let result = rewrite(
            "_ZN3baz3bazEv",
            &tokens(&["baz", "baz"]),
            &table(&[("baz", "X_1")]),
        );
        assert_eq!(result.text, "_ZN3X_13X_1Ev");
    }

    #[test]
    fn test_prefix_identifiers() {
        // `ab` is a prefix of `abc`; each must hit its own field.
        let result = rewrite(
            "_ZN3abc2abEv",
            &tokens(&["abc", "ab"]),
            &table(&[("ab", "P_1"), ("abc", "P_2")]),
        );
        assert_eq!(result.text, "_ZN3P_23P_1Ev");
    }

    #[test]
    fn test_identifier_ending_in_digit() {
        // The length field of `bar` directly follows the digit ending `foo2`.
        let result = rewrite(
            "_ZN4foo23barEv",
            &tokens(&["foo2", "bar"]),
            &table(&[("foo2", "A_1"), ("bar", "A_2")]),
        );
        assert_eq!(result.text, "_ZN3A_13A_2Ev");
    }

    #[test]
    fn test_length_field_not_split() {
        // `3foo` appears inside `13fooxxxxxxxxxx` but is not a field there.
        assert_eq!(find_envelope("_ZN13fooxxxxxxxxxx3fooEv", 0, "3foo"), Some(18));

        let result = rewrite(
            "_ZN13fooxxxxxxxxxx3fooEv",
            &[Token::reserved("fooxxxxxxxxxx"), Token::new("foo")],
            &table(&[("foo", "B_1")]),
        );
        assert_eq!(result.text, "_ZN13fooxxxxxxxxxx3B_1Ev");
    }

    #[test]
    fn test_unmapped_token() {
        let result = rewrite("_Z3fooi", &tokens(&["foo"]), &RenameTable::default());
        assert_eq!(result.text, "_Z3fooi");
        assert_eq!(result.error, Some(RewriteError::Unmapped { token: "foo".into() }));
    }

    #[test]
    fn test_reserved_token_skipped() {
        let result = rewrite(
            "_ZN14__cxa_reserved3fooEv",
            &tokens(&["__cxa_reserved", "foo"]),
            &table(&[("foo", "C_1")]),
        );
        assert_eq!(result.text, "_ZN14__cxa_reserved3C_1Ev");
        assert!(result.is_complete());
    }

    #[test]
    fn test_missing_token_keeps_partial_result() {
        let result = rewrite(
            "_ZN3foo3barEv",
            &tokens(&["foo", "qux", "bar"]),
            &table(&[("foo", "D_1"), ("bar", "D_2"), ("qux", "D_3")]),
        );
        assert_eq!(result.text, "_ZN3D_13barEv");
        assert_eq!(
            result.error,
            Some(RewriteError::TokenNotFound {
                token: "qux".into(),
                offset: 7,
            })
        );
    }

    #[test]
    fn test_out_of_order_tokens_are_misaligned() {
        let result = rewrite(
            "_ZN3foo3barEv",
            &tokens(&["bar", "foo"]),
            &table(&[("foo", "E_1"), ("bar", "E_2")]),
        );
        assert_eq!(result.text, "_ZN3foo3E_2Ev");
        assert!(!result.is_complete());
    }

    #[test]
    fn test_back_reference_is_not_a_field() {
        let mangled = "_Z1f1A1B1C1DS2_m2_m";
        let parsed = cxxsr_demangle::demangle_with_tokens(mangled).unwrap();
        let table = table(&[
            ("A", "F_1"),
            ("B", "F_2"),
            ("C", "F_3"),
            ("D", "F_4"),
            ("_m", "F_5"),
            ("f", "F_6"),
        ]);

        let result = rewrite(mangled, &parsed.tokens, &table);
        assert!(result.is_complete());
        assert_eq!(result.text, "_Z3F_63F_13F_23F_33F_4S2_m3F_5");

        let reparsed = cxxsr_demangle::demangle_with_tokens(&result.text).unwrap();
        assert_eq!(reparsed.display, "F_6(F_1, F_2, F_3, F_4, F_4, unsigned long, F_5)");
    }

    #[test]
    fn test_pinned_token_must_match_field() {
        // The token claims offset 4, where `1f` is not its field.
        let result = rewrite(
            "_Z1f1gv",
            &[Token::new("f").at(4)],
            &table(&[("f", "G_1")]),
        );
        assert_eq!(result.text, "_Z1f1gv");
        assert_eq!(
            result.error,
            Some(RewriteError::TokenNotFound {
                token: "f".into(),
                offset: 0,
            })
        );
    }

    #[test]
    fn test_pinned_tokens_shift_with_replacements() {
        let result = rewrite(
            "_ZN3foo3fooEv",
            &[Token::new("foo").at(3), Token::new("foo").at(7)],
            &table(&[("foo", "LONGER_1")]),
        );
        assert_eq!(result.text, "_ZN8LONGER_18LONGER_1Ev");
        assert!(result.is_complete());
    }

    #[test]
    fn test_no_tokens() {
        let result = rewrite("_ZTVN10__cxxabiv117__class_type_infoE", &[], &RenameTable::default());
        assert_eq!(result.text, "_ZTVN10__cxxabiv117__class_type_infoE");
        assert!(result.is_complete());
    }
}
