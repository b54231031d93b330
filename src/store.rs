//! External collaborator contracts / 外部协作者契约
//!
//! The engine is read-only against the document store: it lists pages of a
//! user's active documents during index rebuilds and fetches single latest
//! versions during result construction. / 引擎对文档存储只读：重建索引时分页
//! 列出文档，构造结果时按文件名取最新版本。
//!
//! Call direction: Engine → Store (unidirectional) / 调用方向：引擎 → 存储（单向）

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::search::schema::SearchResult;

/// Projection hint for paginated scans / 分页扫描的字段投影提示
///
/// `Scan` asks the store to return only file name, code, tags, language and
/// updated time; stores that cannot project simply return full documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentProjection {
    Full,
    Scan,
}

/// A stored code file as the document store exposes it / 存储层暴露的代码文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// File name; missing or blank when the stored row is damaged / 文件名
    pub file_name: Option<String>,
    /// Full source text / 完整源码内容
    pub code: String,
    /// Declared language, if any / 声明的语言
    pub language: Option<String>,
    /// Free-form tags / 自由标签
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time / 创建时间
    pub created_at: DateTime<Utc>,
    /// Last update time / 更新时间
    pub updated_at: DateTime<Utc>,
    /// Version as stored - loosely typed, see [`normalize_version`] / 松散类型的版本号
    #[serde(default)]
    pub version: serde_json::Value,
}

impl StoredDocument {
    /// Trimmed, non-empty file name, or None when unusable / 可用的文件名
    pub fn usable_file_name(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Coerce a loosely-typed stored version into a positive integer / 版本号归一化
///
/// Positive integers pass through, numeric strings parse; booleans, zero,
/// negatives and anything else default to 1.
pub fn normalize_version(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                if v >= 1 {
                    return v.min(u64::from(u32::MAX)) as u32;
                }
            } else if let Some(f) = n.as_f64() {
                if f >= 1.0 {
                    return (f as u64).min(u64::from(u32::MAX)) as u32;
                }
            }
            1
        }
        serde_json::Value::String(s) => match s.trim().parse::<u32>() {
            Ok(v) if v >= 1 => v,
            _ => 1,
        },
        _ => 1,
    }
}

/// Paginated, read-only access to a user's documents / 用户文档的分页只读访问
///
/// `list_active_documents` must support offset paging; the engine keeps
/// requesting pages until an empty one comes back.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List one page of the user's active documents / 列出一页活跃文档
    async fn list_active_documents(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
        projection: DocumentProjection,
    ) -> Result<Vec<StoredDocument>>;

    /// Fetch the latest version of a single file / 获取单个文件的最新版本
    async fn get_latest_version(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Option<StoredDocument>>;
}

/// A named function found in source text / 源码中提取到的函数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFunction {
    pub name: String,
    /// 1-based line of the definition / 定义所在行（从1开始）
    pub line: usize,
}

/// Best-effort extraction of named functions / 尽力而为的函数名提取
///
/// Implementations should not fail on malformed input; any error returned is
/// treated by the engine as "no functions found".
pub trait FunctionExtractor: Send + Sync {
    fn extract_functions(
        &self,
        content: &str,
        language: Option<&str>,
    ) -> Result<Vec<ExtractedFunction>>;
}

/// Vector/semantic search provider, used by SEMANTIC mode only / 向量搜索提供方
#[async_trait]
pub trait VectorSearchProvider: Send + Sync {
    async fn semantic_search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// In-memory document store / 内存文档存储
///
/// The simplest faithful [`DocumentStore`]: one latest document per file
/// name, offset paging over a name-sorted snapshot. Used by the test suite
/// and by embedders that keep small corpora in process.
#[derive(Default)]
pub struct MemoryDocumentStore {
    /// user_id -> file_name -> document / 用户 -> 文件名 -> 文档
    docs: RwLock<HashMap<String, HashMap<String, StoredDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document / 插入或替换文档
    pub fn put(&self, user_id: &str, doc: StoredDocument) {
        let Some(name) = doc.usable_file_name().map(str::to_string) else {
            return;
        };
        let mut docs = self.docs.write();
        docs.entry(user_id.to_string()).or_default().insert(name, doc);
    }

    /// Convenience insert for plain source files / 便捷插入
    pub fn put_source(
        &self,
        user_id: &str,
        file_name: &str,
        code: &str,
        language: Option<&str>,
        tags: &[&str],
    ) {
        let now = Utc::now();
        self.put(
            user_id,
            StoredDocument {
                file_name: Some(file_name.to_string()),
                code: code.to_string(),
                language: language.map(str::to_string),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                created_at: now,
                updated_at: now,
                version: serde_json::json!(1),
            },
        );
    }

    /// Number of documents stored for a user / 用户的文档数量
    pub fn count(&self, user_id: &str) -> usize {
        self.docs.read().get(user_id).map(|m| m.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_active_documents(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
        _projection: DocumentProjection,
    ) -> Result<Vec<StoredDocument>> {
        let docs = self.docs.read();
        let Some(user_docs) = docs.get(user_id) else {
            return Ok(Vec::new());
        };

        // Stable page boundaries: snapshot sorted by file name / 按文件名排序保证分页稳定
        let mut names: Vec<&String> = user_docs.keys().collect();
        names.sort();

        Ok(names
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|name| user_docs.get(name).cloned())
            .collect())
    }

    async fn get_latest_version(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Option<StoredDocument>> {
        let docs = self.docs.read();
        Ok(docs
            .get(user_id)
            .and_then(|user_docs| user_docs.get(file_name))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version(&json!(3)), 3);
        assert_eq!(normalize_version(&json!(1)), 1);
        assert_eq!(normalize_version(&json!(0)), 1);
        assert_eq!(normalize_version(&json!(-2)), 1);
        assert_eq!(normalize_version(&json!(2.9)), 2);
        assert_eq!(normalize_version(&json!("7")), 7);
        assert_eq!(normalize_version(&json!(" 12 ")), 12);
        assert_eq!(normalize_version(&json!("v2")), 1);
        assert_eq!(normalize_version(&json!(true)), 1);
        assert_eq!(normalize_version(&json!(null)), 1);
        assert_eq!(normalize_version(&json!({"n": 4})), 1);
    }

    #[tokio::test]
    async fn test_memory_store_paging() {
        let store = MemoryDocumentStore::new();
        for i in 0..5 {
            store.put_source("u1", &format!("f{}.py", i), "pass", Some("python"), &[]);
        }

        let page1 = store
            .list_active_documents("u1", 2, 0, DocumentProjection::Full)
            .await
            .unwrap();
        let page2 = store
            .list_active_documents("u1", 2, 2, DocumentProjection::Full)
            .await
            .unwrap();
        let page3 = store
            .list_active_documents("u1", 2, 4, DocumentProjection::Full)
            .await
            .unwrap();
        let page4 = store
            .list_active_documents("u1", 2, 6, DocumentProjection::Full)
            .await
            .unwrap();

        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_eq!(page3.len(), 1);
        assert!(page4.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_latest_version() {
        let store = MemoryDocumentStore::new();
        store.put_source("u1", "a.py", "def foo(): pass", Some("python"), &["demo"]);

        let doc = store.get_latest_version("u1", "a.py").await.unwrap();
        assert!(doc.is_some());
        assert!(store.get_latest_version("u1", "b.py").await.unwrap().is_none());
        assert!(store.get_latest_version("u2", "a.py").await.unwrap().is_none());
    }

    #[test]
    fn test_unusable_file_name_is_not_stored() {
        let store = MemoryDocumentStore::new();
        let now = Utc::now();
        store.put(
            "u1",
            StoredDocument {
                file_name: Some("   ".to_string()),
                code: "x".to_string(),
                language: None,
                tags: vec![],
                created_at: now,
                updated_at: now,
                version: json!(1),
            },
        );
        assert_eq!(store.count("u1"), 0);
    }
}
