//! Tokenizer - word-run extraction for the inverted index / 分词器
//!
//! Index and query tokenization must stay consistent: runs of word
//! characters, lowercased, length >= 2. Query tokenization additionally
//! drops stop words. / 索引与查询分词保持一致：连续单词字符，转小写，长度>=2；
//! 查询分词额外去掉停用词。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Common English stop words / 常见英文停用词
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "not", "is", "are", "was", "were", "be", "been", "in",
        "on", "at", "to", "of", "for", "with", "by", "from", "as", "it", "its", "this", "that",
        "these", "those", "but", "if", "then", "else", "do", "does", "did", "no", "yes",
    ]
    .into_iter()
    .collect()
});

/// Tokenize text for indexing / 对文本进行索引分词
///
/// Runs of word characters, lowercased, shorter than 2 characters dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RUNS
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

/// Tokenize a search query / 对搜索查询进行分词
///
/// Same rules as [`tokenize`], plus stop-word removal.
pub fn tokenize_query(query: &str) -> Vec<String> {
    tokenize(query)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// 1-based line number of a byte offset / 字节偏移对应的行号（从1开始）
pub fn line_number(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Hello, World! fn_name x");
        assert_eq!(tokens, vec!["hello", "world", "fn_name"]);
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("a b cd");
        assert_eq!(tokens, vec!["cd"]);
    }

    #[test]
    fn test_tokenize_query_drops_stop_words() {
        let tokens = tokenize_query("the quick and the dead");
        assert_eq!(tokens, vec!["quick", "dead"]);
    }

    #[test]
    fn test_tokenize_query_only_stop_words() {
        assert!(tokenize_query("the and of").is_empty());
    }

    #[test]
    fn test_line_number() {
        let content = "one\ntwo\nthree";
        assert_eq!(line_number(content, 0), 1);
        assert_eq!(line_number(content, 4), 2);
        assert_eq!(line_number(content, 8), 3);
        // Offset past the end clamps to the last line / 超出末尾按最后一行
        assert_eq!(line_number(content, 1000), 3);
    }

}
