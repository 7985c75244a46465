//! Placeholder parser for `{{variable}}` and `${variable}` syntax
//!
//! Parses strings to extract placeholder references with their positions.
//! Both syntaxes are recognized in a single left-to-right scan.

use std::ops::Range;

/// The delimiter style a placeholder was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderSyntax {
    /// `{{name}}`
    DoubleBrace,
    /// `${name}`
    DollarBrace,
}

/// Represents a parsed placeholder reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// The variable name (whitespace trimmed, without delimiters).
    pub name: String,

    /// The delimiter style used.
    pub syntax: PlaceholderSyntax,

    /// Byte range in the original string where this reference appears.
    pub span: Range<usize>,
}

impl PlaceholderRef {
    /// Creates a new placeholder reference.
    #[must_use]
    pub fn new(name: impl Into<String>, syntax: PlaceholderSyntax, span: Range<usize>) -> Self {
        Self {
            name: name.into(),
            syntax,
            span,
        }
    }
}

/// Parses a string and extracts all placeholder references.
///
/// Supports `{{ name }}` and `${ name }` simultaneously; whitespace
/// around the name is trimmed, empty names are skipped, and an
/// unterminated placeholder ends the scan.
///
/// # Examples
///
/// ```
/// use apiary_application::resolver::parse_placeholders;
///
/// let refs = parse_placeholders("{{host}}/api/${id}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "host");
/// assert_eq!(refs[1].name, "id");
/// ```
#[must_use]
pub fn parse_placeholders(input: &str) -> Vec<PlaceholderRef> {
    let mut references = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next(); // consume second {
                    let mut name = String::new();
                    let mut found_end = false;

                    // Read until }}
                    while let Some((_, ch)) = chars.next() {
                        if ch == '}'
                            && let Some((end_idx, '}')) = chars.peek()
                        {
                            let end = *end_idx + 1;
                            chars.next(); // consume second }

                            let trimmed = name.trim();
                            if !trimmed.is_empty() {
                                references.push(PlaceholderRef::new(
                                    trimmed,
                                    PlaceholderSyntax::DoubleBrace,
                                    i..end,
                                ));
                            }
                            found_end = true;
                            break;
                        }
                        name.push(ch);
                    }

                    // If we didn't find the closing }}, stop to avoid rescanning
                    if !found_end {
                        break;
                    }
                }
            }
            '$' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next(); // consume {
                    let mut name = String::new();
                    let mut found_end = false;

                    // Read until }
                    while let Some((end_idx, ch)) = chars.next() {
                        if ch == '}' {
                            let end = end_idx + 1;
                            let trimmed = name.trim();
                            if !trimmed.is_empty() {
                                references.push(PlaceholderRef::new(
                                    trimmed,
                                    PlaceholderSyntax::DollarBrace,
                                    i..end,
                                ));
                            }
                            found_end = true;
                            break;
                        }
                        name.push(ch);
                    }

                    if !found_end {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    references
}

/// Validates a variable name.
/// Valid names: a letter or underscore followed by alphanumerics,
/// underscores, or hyphens.
#[must_use]
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Returns true if the input string contains any placeholder references.
#[must_use]
pub fn has_placeholders(input: &str) -> bool {
    (input.contains("{{") && input.contains("}}")) || input.contains("${")
}
