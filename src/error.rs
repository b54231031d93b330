//! Search error taxonomy / 搜索错误分类
//!
//! Nothing here ever crosses the public API boundary: `search`,
//! `suggest_completions` and `search_statistics` absorb every variant and
//! report it through the event sink instead. / 所有错误都在公共 API 边界被吸收，
//! 只通过事件上报。

use thiserror::Error;

/// Errors produced while running a search or rebuilding an index / 搜索或重建索引时产生的错误
#[derive(Debug, Error)]
pub enum SearchError {
    /// Document store failed mid-scan / 文档存储中途失败
    #[error("document store error: {0}")]
    Store(anyhow::Error),

    /// User-supplied regex did not compile / 用户提供的正则无法编译
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(String),

    /// Filename filter regex did not compile / 文件名过滤正则无法编译
    #[error("invalid file pattern: {0}")]
    InvalidFilePattern(String),

    /// Caller cancelled a paginated scan / 调用方取消了分页扫描
    #[error("search cancelled by caller")]
    Cancelled,

    /// SEMANTIC mode reached while disabled or without a provider / 语义搜索未启用
    #[error("semantic search is not enabled")]
    SemanticDisabled,
}
