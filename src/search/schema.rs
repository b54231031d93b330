//! Search data models / 搜索数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::store::{normalize_version, StoredDocument};

/// Search strategy selector / 搜索策略选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Text,
    Regex,
    Fuzzy,
    Function,
    Content,
    Semantic,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Text => "text",
            SearchType::Regex => "regex",
            SearchType::Fuzzy => "fuzzy",
            SearchType::Function => "function",
            SearchType::Content => "content",
            SearchType::Semantic => "semantic",
        }
    }
}

/// Result ordering / 结果排序
///
/// Unknown identifiers parse to `Unsorted` (insertion order, no-op) instead
/// of failing - the upstream caller speaks loosely-typed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    DateAsc,
    DateDesc,
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    Unsorted,
}

impl SortOrder {
    /// Parse a loose sort identifier, falling back to `Unsorted` / 宽松解析排序标识
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "relevance" => SortOrder::Relevance,
            "date_asc" => SortOrder::DateAsc,
            "date_desc" => SortOrder::DateDesc,
            "name_asc" => SortOrder::NameAsc,
            "name_desc" => SortOrder::NameDesc,
            "size_asc" => SortOrder::SizeAsc,
            "size_desc" => SortOrder::SizeDesc,
            _ => SortOrder::Unsorted,
        }
    }
}

/// Query constraints - every field is independently optional / 查询约束
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Allowed languages / 允许的语言集合
    pub languages: Option<Vec<String>>,
    /// Required tags (at least one must match) / 必须命中的标签（至少一个）
    pub tags: Option<Vec<String>>,
    /// Updated-at lower bound / 更新时间下界
    pub date_from: Option<DateTime<Utc>>,
    /// Updated-at upper bound / 更新时间上界
    pub date_to: Option<DateTime<Utc>>,
    /// Minimum content size in bytes / 最小内容大小（字节）
    pub min_size: Option<usize>,
    /// Maximum content size in bytes / 最大内容大小（字节）
    pub max_size: Option<usize>,
    /// Must (not) contain functions / 是否必须包含函数
    pub has_functions: Option<bool>,
    /// Must (not) contain classes / 是否必须包含类
    pub has_classes: Option<bool>,
    /// Case-insensitive filename regex / 文件名正则（不区分大小写）
    pub file_pattern: Option<String>,
}

impl SearchFilter {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.get_or_insert_with(Vec::new).push(language.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_size_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }
}

/// One match inside a document / 文档内的单个匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Byte offset of the match start / 匹配起始字节偏移
    pub start: usize,
    /// Byte offset of the match end / 匹配结束字节偏移
    pub end: usize,
    /// Matched text / 匹配文本
    pub text: String,
    /// 1-based line number / 行号（从1开始）
    pub line: usize,
}

/// Search result / 搜索结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// File name / 文件名
    pub file_name: String,
    /// Full content / 完整内容
    pub code: String,
    /// Language, if declared / 语言
    pub language: Option<String>,
    /// Tag list / 标签列表
    pub tags: Vec<String>,
    /// Created time / 创建时间
    pub created_at: DateTime<Utc>,
    /// Updated time / 更新时间
    pub updated_at: DateTime<Utc>,
    /// Normalized positive version / 归一化后的版本号
    pub version: u32,
    /// Relevance score - strategy-defined units, not comparable across
    /// strategies / 相关性分数（各策略单位不同，不可跨策略比较）
    pub score: f32,
    /// Ordered match descriptors / 有序匹配描述
    pub matches: Vec<SearchMatch>,
    /// Short preview around the first hit / 首个命中附近的预览
    pub preview: Option<String>,
    /// Highlight ranges within the preview / 预览内的高亮区间
    pub highlights: Vec<(usize, usize)>,
}

impl SearchResult {
    /// Build a result from a stored document / 从存储文档构造结果
    ///
    /// Returns None when the document has no usable file name.
    pub fn from_document(doc: StoredDocument, score: f32) -> Option<Self> {
        let file_name = doc.usable_file_name()?.to_string();
        Some(Self {
            file_name,
            version: normalize_version(&doc.version),
            code: doc.code,
            language: doc.language,
            tags: doc.tags,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            score,
            matches: Vec::new(),
            preview: None,
            highlights: Vec::new(),
        })
    }
}

/// One search call / 一次搜索调用
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query string / 查询串
    pub query: String,
    /// Strategy / 策略
    pub search_type: SearchType,
    /// Optional constraints / 可选约束
    pub filter: Option<SearchFilter>,
    /// Result ordering / 排序
    pub sort: SortOrder,
    /// Maximum results (effective minimum 1) / 最大结果数（实际最小为1）
    pub limit: usize,
    /// Caller-supplied cancellation for paginated scans / 调用方提供的取消令牌
    pub cancel: Option<CancellationToken>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::Text,
            filter: None,
            sort: SortOrder::Relevance,
            limit: 50,
            cancel: None,
        }
    }

    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_parse_falls_back() {
        assert_eq!(SortOrder::parse("name_asc"), SortOrder::NameAsc);
        assert_eq!(SortOrder::parse("NAME_DESC"), SortOrder::NameDesc);
        assert_eq!(SortOrder::parse("whatever"), SortOrder::Unsorted);
        assert_eq!(SortOrder::parse(""), SortOrder::Unsorted);
    }

    #[test]
    fn test_result_from_document_requires_file_name() {
        let now = Utc::now();
        let doc = StoredDocument {
            file_name: None,
            code: "x".to_string(),
            language: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
            version: json!("3"),
        };
        assert!(SearchResult::from_document(doc.clone(), 1.0).is_none());

        let doc = StoredDocument {
            file_name: Some("a.py".to_string()),
            ..doc
        };
        let result = SearchResult::from_document(doc, 1.5).unwrap();
        assert_eq!(result.version, 3);
        assert_eq!(result.score, 1.5);
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("foo")
            .search_type(SearchType::Function)
            .sort(SortOrder::NameAsc)
            .limit(5);
        assert_eq!(request.search_type, SearchType::Function);
        assert_eq!(request.limit, 5);
        assert!(request.filter.is_none());
    }
}
