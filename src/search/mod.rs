//! Search module - per-user indexing and multi-strategy search / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - The engine only exposes primitive operations: search, suggest,
//!   statistics; the caller controls flow / 引擎只暴露原语操作，调用方控制流程
//! - Call direction: Caller → Engine → Store (unidirectional) / 调用方向单向
//!
//! Index features / 索引特性：
//! - Four in-memory inverted maps per user (words, functions, languages,
//!   tags), rebuilt whole on staleness / 每用户四个倒排映射，过期整体重建
//! - Six interchangeable strategies: text, regex, fuzzy, function, content,
//!   semantic / 六种可互换的搜索策略

pub mod engine;
pub mod fuzzy;
pub mod index;
pub mod query;
pub mod schema;
pub mod tokenizer;

pub use engine::{AdvancedSearchEngine, SearchStatistics, TermCount};
pub use index::{document_key, SearchIndex};
pub use query::{parse_query, BoolOperator, ParsedQuery};
pub use schema::{
    SearchFilter, SearchMatch, SearchRequest, SearchResult, SearchType, SortOrder,
};
