//! Clause template scanning.
//!
//! `{n}` is replaced by the rendering of the n-th supplied column and `?`
//! stays a bind marker. Quoted text is copied through untouched: string
//! literals (`'what?'`) as well as backtick or double-quoted identifiers
//! (`` `rate?` ``, `"rate?"`) neither count as bind markers nor hide a
//! placeholder.

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::SqlBuildError;

lazy_static! {
    static ref TEMPLATE_TOKEN: Regex = Regex::new(
        r#"'(?:[^']|'')*'|`(?:[^`]|``)*`|"(?:[^"]|"")*"|\{(\d+)\}|\?"#
    )
    .expect("template token pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplatePart {
    Text(String),
    Column(usize),
    Bind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Template {
    pub(crate) source: String,
    pub(crate) parts: Vec<TemplatePart>,
}

fn push_text(parts: &mut Vec<TemplatePart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TemplatePart::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(TemplatePart::Text(text.to_string()));
    }
}

impl Template {
    /// Scan `source` and check it against the supplied column and value counts.
    pub(crate) fn parse(
        source: &str,
        column_count: usize,
        value_count: usize,
    ) -> Result<Template, SqlBuildError> {
        let mut parts = Vec::new();
        let mut bind_count = 0;
        let mut last = 0;

        for captures in TEMPLATE_TOKEN.captures_iter(source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            push_text(&mut parts, &source[last..whole.start()]);
            last = whole.end();

            if let Some(index) = captures.get(1) {
                let index: usize =
                    index
                        .as_str()
                        .parse()
                        .map_err(|_| SqlBuildError::PlaceholderOutOfRange {
                            template: source.to_string(),
                            index: usize::MAX,
                            supplied: column_count,
                        })?;
                if index >= column_count {
                    return Err(SqlBuildError::PlaceholderOutOfRange {
                        template: source.to_string(),
                        index,
                        supplied: column_count,
                    });
                }
                parts.push(TemplatePart::Column(index));
            } else if whole.as_str() == "?" {
                bind_count += 1;
                parts.push(TemplatePart::Bind);
            } else {
                // quoted literal or identifier
                push_text(&mut parts, whole.as_str());
            }
        }
        push_text(&mut parts, &source[last..]);

        if bind_count != value_count {
            return Err(SqlBuildError::BindCountMismatch {
                template: source.to_string(),
                expected: bind_count,
                supplied: value_count,
            });
        }

        Ok(Template {
            source: source.to_string(),
            parts,
        })
    }
}
