/// LIKE and MATCH support
///
/// LIKE never gets its own matcher: the pattern is escaped, its wildcards are
/// turned into regex syntax and the result is anchored, after which it runs
/// through the same MATCH path.

use regex::{Regex, RegexBuilder};
use crate::core::{Comparer, Culture, QueryError};

/// `A%B_C` becomes `^A.*B.C$`. Wildcards are substituted after escaping, so
/// regex metacharacters in the input stay literal.
#[must_use]
pub fn like_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern);
    format!("^{}$", escaped.replace('%', ".*").replace('_', "."))
}

/// Case-insensitive patterns under a specific culture have their literal
/// characters lower-cased with that culture, matching what `is_match` does
/// to the text.
pub fn compile(pattern: &str, comparer: &Comparer) -> Result<Regex, QueryError> {
    let culture = comparer.culture();
    let source = if !comparer.is_case_sensitive() && !culture.is_invariant() {
        fold_literals(pattern, culture)
    } else {
        pattern.to_string()
    };
    Ok(RegexBuilder::new(&source)
        .case_insensitive(!comparer.is_case_sensitive())
        .build()?)
}

/// Lower-cases everything but escape sequences and `(?flags)` groups, so
/// `\W` stays a non-word class and `(?U)` keeps its meaning.
fn fold_literals(pattern: &str, culture: &Culture) -> String {
    let mut folded = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                folded.push(c);
                if let Some(escaped) = chars.next() {
                    folded.push(escaped);
                }
            }
            '(' if chars.peek() == Some(&'?') => {
                folded.push(c);
                for flag in chars.by_ref() {
                    folded.push(flag);
                    if flag == ':' || flag == ')' {
                        break;
                    }
                }
            }
            _ => folded.push_str(&culture.to_lower(c.encode_utf8(&mut [0; 4]))),
        }
    }
    folded
}

/// Case-insensitive matching under a specific culture lower-cases the text
/// with that culture first (Turkish dotless i and friends).
#[must_use]
pub fn is_match(regex: &Regex, text: &str, comparer: &Comparer) -> bool {
    let culture = comparer.culture();
    if !comparer.is_case_sensitive() && !culture.is_invariant() {
        regex.is_match(&culture.to_lower(text))
    } else {
        regex.is_match(text)
    }
}
