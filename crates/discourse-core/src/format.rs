//! # Format Templates
//!
//! Legacy node types are recognized by title shape rather than by a
//! specification query. A template such as `[[CLM]] - {content}` becomes the
//! anchored expression `^\[\[CLM\]\] - (.*?)$`.
//!
//! - Literal text is escaped (brackets included)
//! - The single `{content}` placeholder becomes a capturing wildcard
//! - Any other `{...}` placeholder becomes a non-capturing wildcard

use crate::primitives::CONTENT_PLACEHOLDER;
use crate::types::DiscourseError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{[^{}]*\}").expect("static regex");
}

/// Count `{content}` occurrences (case-insensitive).
#[must_use]
pub fn content_placeholders(template: &str) -> usize {
    template
        .to_lowercase()
        .matches(CONTENT_PLACEHOLDER)
        .count()
}

/// Derive the anchored regular expression source for a template.
///
/// Fails unless the template contains exactly one `{content}` placeholder.
pub fn format_expression(template: &str) -> Result<String, DiscourseError> {
    let found = content_placeholders(template);
    if found != 1 {
        return Err(DiscourseError::InvalidFormatTemplate {
            template: template.to_string(),
            found,
        });
    }

    let mut expression = String::from("^");
    let mut cursor = 0;
    for placeholder in PLACEHOLDER.find_iter(template) {
        expression.push_str(&regex::escape(&template[cursor..placeholder.start()]));
        if placeholder.as_str().eq_ignore_ascii_case(CONTENT_PLACEHOLDER) {
            expression.push_str("(.*?)");
        } else {
            expression.push_str("(?:.*?)");
        }
        cursor = placeholder.end();
    }
    expression.push_str(&regex::escape(&template[cursor..]));
    expression.push('$');
    Ok(expression)
}

/// A compiled format template.
#[derive(Debug, Clone)]
pub struct FormatMatcher {
    regex: Regex,
}

impl FormatMatcher {
    /// Compile a template.
    pub fn new(template: &str) -> Result<Self, DiscourseError> {
        let expression = format_expression(template)?;
        let regex =
            Regex::new(&expression).map_err(|e| DiscourseError::InvalidExpression(e.to_string()))?;
        Ok(Self { regex })
    }

    /// Whether the whole title has the template's shape.
    #[must_use]
    pub fn is_match(&self, title: &str) -> bool {
        self.regex.is_match(title)
    }

    /// The text captured by `{content}`.
    #[must_use]
    pub fn content<'t>(&self, title: &'t str) -> Option<&'t str> {
        self.regex
            .captures(title)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// The derived expression source.
    #[must_use]
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }
}

// =============================================================================
// TESTS
// =============================================================================
