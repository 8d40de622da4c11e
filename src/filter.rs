//! Filter builder for the listing query.
//!
//! A filter is the AND of an optional title substring match and an optional
//! OR-group of substring matches against the raw tag column. Tag terms match
//! the encoded column text, not individual decoded tags, so `"java"` also
//! matches a video tagged `javascript`.

use libsql::Value;

/// Storage-agnostic description of which videos a listing should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    /// Substring the title must contain.
    pub title_contains: Option<String>,
    /// The raw tag column must contain at least one of these terms.
    pub tags_contain_any: Vec<String>,
}

/// Parameterized SQL fragment suitable for a `WHERE` clause.
#[derive(Debug, Clone)]
pub struct SqlPredicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl VideoFilter {
    /// Builds a filter from the listing's `search` text and comma separated
    /// `tags` list. Blank search text and blank tag segments are ignored.
    pub fn build(search: Option<&str>, tags: Option<&str>) -> Self {
        let title_contains = search
            .filter(|search| !search.is_empty())
            .map(str::to_owned);
        let tags_contain_any = tags.map(split_tag_terms).unwrap_or_default();
        Self {
            title_contains,
            tags_contain_any,
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.title_contains.is_none() && self.tags_contain_any.is_empty()
    }

    /// Renders the filter against the `videos` table columns.
    ///
    /// `instr` keeps the match case-sensitive and treats `%` and `_` in user
    /// input as literal characters.
    pub fn to_sql(&self) -> SqlPredicate {
        if self.is_match_all() {
            return SqlPredicate {
                sql: "1 = 1".to_string(),
                params: Vec::new(),
            };
        }

        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(search) = &self.title_contains {
            clauses.push("instr(title, ?) > 0".to_string());
            params.push(Value::Text(search.clone()));
        }

        if !self.tags_contain_any.is_empty() {
            let terms = vec!["instr(tags, ?) > 0"; self.tags_contain_any.len()];
            clauses.push(format!("({})", terms.join(" OR ")));
            params.extend(
                self.tags_contain_any
                    .iter()
                    .map(|term| Value::Text(term.clone())),
            );
        }

        SqlPredicate {
            sql: clauses.join(" AND "),
            params,
        }
    }
}

fn split_tag_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(params: &[Value]) -> Vec<&str> {
        params
            .iter()
            .map(|param| match param {
                Value::Text(text) => text.as_str(),
                other => panic!("unexpected parameter {other:?}"),
            })
            .collect()
    }

    #[test]
    fn no_input_matches_everything() {
        let filter = VideoFilter::build(None, None);
        assert!(filter.is_match_all());
        let predicate = filter.to_sql();
        assert_eq!(predicate.sql, "1 = 1");
        assert!(predicate.params.is_empty());
    }

    #[test]
    fn empty_search_is_ignored() {
        assert!(VideoFilter::build(Some(""), None).is_match_all());
    }

    #[test]
    fn blank_tag_segments_are_dropped() {
        let filter = VideoFilter::build(None, Some(" , ,,"));
        assert!(filter.is_match_all());

        let filter = VideoFilter::build(None, Some(" react , ,css "));
        assert_eq!(filter.tags_contain_any, vec!["react", "css"]);
    }

    #[test]
    fn search_only_matches_title() {
        let predicate = VideoFilter::build(Some("JavaScript"), None).to_sql();
        assert_eq!(predicate.sql, "instr(title, ?) > 0");
        assert_eq!(texts(&predicate.params), vec!["JavaScript"]);
    }

    #[test]
    fn tags_only_or_each_term() {
        let predicate = VideoFilter::build(None, Some("advanced,javascript")).to_sql();
        assert_eq!(predicate.sql, "(instr(tags, ?) > 0 OR instr(tags, ?) > 0)");
        assert_eq!(texts(&predicate.params), vec!["advanced", "javascript"]);
    }

    #[test]
    fn search_and_tags_are_combined_with_and() {
        let filter = VideoFilter::build(Some("Java"), Some("beginner,react"));
        assert_eq!(filter.title_contains.as_deref(), Some("Java"));
        assert_eq!(filter.tags_contain_any, vec!["beginner", "react"]);

        let predicate = filter.to_sql();
        assert_eq!(
            predicate.sql,
            "instr(title, ?) > 0 AND (instr(tags, ?) > 0 OR instr(tags, ?) > 0)"
        );
        assert_eq!(texts(&predicate.params), vec!["Java", "beginner", "react"]);
    }
}
