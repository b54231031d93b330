//! Advanced query string parser / 高级查询串解析器
//!
//! Splits on whitespace: `lang:` / `tag:` / `size:` directives populate a
//! [`SearchFilter`], `AND`/`OR`/`NOT` are recorded as operators, everything
//! else is a free search term. Boolean combination and the `func:`/`date:`
//! directives are recognized here but deliberately not wired into result
//! combination - they are a separate, independently testable extension.
//! / 按空白切分：lang:/tag:/size: 指令写入过滤器，AND/OR/NOT 记录为操作符，
//! 其余为自由词。布尔组合与 func:/date: 仅做识别，不参与结果组合。

use serde::Serialize;

use super::schema::SearchFilter;

/// Boolean operator token / 布尔操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOperator {
    And,
    Or,
    Not,
}

/// Parse output: filter + free terms + recognized extensions / 解析输出
#[derive(Debug, Clone, Default)]
pub struct ParsedQuery {
    /// Free-text search terms / 自由搜索词
    pub terms: Vec<String>,
    /// Filter assembled from directives / 指令组装出的过滤器
    pub filter: SearchFilter,
    /// Recognized boolean operators, in query order / 按出现顺序记录的布尔操作符
    pub operators: Vec<BoolOperator>,
    /// `func:` directives, lowercased / func: 指令（小写）
    pub function_hints: Vec<String>,
    /// `date:` directives, raw / date: 指令（原样）
    pub date_hints: Vec<String>,
}

impl ParsedQuery {
    /// Remaining free text, space-joined / 剩余自由文本
    pub fn free_text(&self) -> String {
        self.terms.join(" ")
    }
}

/// Parse an advanced query string / 解析高级查询串
pub fn parse_query(query: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    for token in query.split_whitespace() {
        if let Some(op) = parse_operator(token) {
            parsed.operators.push(op);
            continue;
        }

        if let Some((directive, value)) = token.split_once(':') {
            if apply_directive(&mut parsed, directive, value) {
                continue;
            }
        }

        parsed.terms.push(token.to_string());
    }

    parsed
}

fn parse_operator(token: &str) -> Option<BoolOperator> {
    if token.eq_ignore_ascii_case("and") {
        Some(BoolOperator::And)
    } else if token.eq_ignore_ascii_case("or") {
        Some(BoolOperator::Or)
    } else if token.eq_ignore_ascii_case("not") {
        Some(BoolOperator::Not)
    } else {
        None
    }
}

/// Apply one directive; false means the token was not a known directive.
/// 应用单个指令；返回 false 表示不是已知指令。
fn apply_directive(parsed: &mut ParsedQuery, directive: &str, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    match directive.to_lowercase().as_str() {
        "lang" => {
            parsed
                .filter
                .languages
                .get_or_insert_with(Vec::new)
                .push(value.to_string());
            true
        }
        "tag" => {
            parsed
                .filter
                .tags
                .get_or_insert_with(Vec::new)
                .push(value.to_lowercase());
            true
        }
        "size" => apply_size_directive(&mut parsed.filter, value),
        "func" => {
            parsed.function_hints.push(value.to_lowercase());
            true
        }
        "date" => {
            parsed.date_hints.push(value.to_string());
            true
        }
        _ => false,
    }
}

/// `size:>N`, `size:<N` and `size:A-B` / 三种数值范围形式
fn apply_size_directive(filter: &mut SearchFilter, value: &str) -> bool {
    if let Some(n) = value.strip_prefix('>') {
        if let Ok(n) = n.parse::<usize>() {
            filter.min_size = Some(n);
            return true;
        }
    } else if let Some(n) = value.strip_prefix('<') {
        if let Ok(n) = n.parse::<usize>() {
            filter.max_size = Some(n);
            return true;
        }
    } else if let Some((low, high)) = value.split_once('-') {
        if let (Ok(low), Ok(high)) = (low.parse::<usize>(), high.parse::<usize>()) {
            filter.min_size = Some(low);
            filter.max_size = Some(high);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_terms() {
        let parsed = parse_query("binary search tree");
        assert_eq!(parsed.terms, vec!["binary", "search", "tree"]);
        assert!(parsed.filter.languages.is_none());
        assert!(parsed.operators.is_empty());
    }

    #[test]
    fn test_lang_and_tag_directives() {
        let parsed = parse_query("lang:python tag:Demo sort");
        assert_eq!(parsed.filter.languages, Some(vec!["python".to_string()]));
        assert_eq!(parsed.filter.tags, Some(vec!["demo".to_string()]));
        assert_eq!(parsed.terms, vec!["sort"]);
    }

    #[test]
    fn test_size_directives() {
        assert_eq!(parse_query("size:>100").filter.min_size, Some(100));
        assert_eq!(parse_query("size:<500").filter.max_size, Some(500));

        let between = parse_query("size:100-500").filter;
        assert_eq!(between.min_size, Some(100));
        assert_eq!(between.max_size, Some(500));

        // Unparseable size falls back to a free term / 解析失败退化为自由词
        let bad = parse_query("size:big");
        assert!(bad.filter.min_size.is_none());
        assert_eq!(bad.terms, vec!["size:big"]);
    }

    #[test]
    fn test_operators_recorded_not_consumed_as_terms() {
        let parsed = parse_query("foo AND bar not baz");
        assert_eq!(parsed.terms, vec!["foo", "bar", "baz"]);
        assert_eq!(
            parsed.operators,
            vec![BoolOperator::And, BoolOperator::Not]
        );
    }

    #[test]
    fn test_func_and_date_hints() {
        let parsed = parse_query("func:Main date:2024-01-01 handler");
        assert_eq!(parsed.function_hints, vec!["main"]);
        assert_eq!(parsed.date_hints, vec!["2024-01-01"]);
        assert_eq!(parsed.terms, vec!["handler"]);
    }

    #[test]
    fn test_unknown_directive_is_a_term() {
        let parsed = parse_query("owner:me");
        assert_eq!(parsed.terms, vec!["owner:me"]);
    }

    #[test]
    fn test_empty_query() {
        let parsed = parse_query("   ");
        assert!(parsed.terms.is_empty());
        assert!(parsed.operators.is_empty());
    }
}
