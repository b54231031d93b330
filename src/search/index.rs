//! Per-user inverted index / 每用户倒排索引
//!
//! Four membership maps (words, function names, languages, tags) keyed by
//! document key `user_id:file_name`, plus the last build time. An index is
//! always built fresh and swapped in whole - readers never see a partially
//! populated one. / 四个成员关系映射加最近构建时间；索引总是整体重建后替换，
//! 读者不会看到半成品。

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;

use super::tokenizer::tokenize;
use crate::error::SearchError;
use crate::store::{DocumentProjection, DocumentStore, FunctionExtractor, StoredDocument};

/// Composite document identity / 复合文档标识
pub fn document_key(user_id: &str, file_name: &str) -> String {
    format!("{}:{}", user_id, file_name)
}

/// File name part of a document key / 文档标识中的文件名部分
pub fn file_name_of_key(key: &str) -> &str {
    key.split_once(':').map(|(_, name)| name).unwrap_or(key)
}

/// Inverted index over one user's corpus / 单个用户语料的倒排索引
#[derive(Debug, Clone)]
pub struct SearchIndex {
    /// term -> document keys / 词项 -> 文档标识
    pub(crate) word_index: HashMap<String, HashSet<String>>,
    /// lowercased function name -> document keys / 小写函数名 -> 文档标识
    pub(crate) function_index: HashMap<String, HashSet<String>>,
    /// language tag -> document keys / 语言 -> 文档标识
    pub(crate) language_index: HashMap<String, HashSet<String>>,
    /// lowercased tag -> document keys / 小写标签 -> 文档标识
    pub(crate) tag_index: HashMap<String, HashSet<String>>,
    /// Last full rebuild time / 最近一次完整重建时间
    last_update: DateTime<Utc>,
    /// Documents indexed by the last rebuild / 最近一次重建索引的文档数
    document_count: usize,
}

impl SearchIndex {
    /// Empty index that is immediately stale / 立即过期的空索引
    pub fn empty() -> Self {
        Self {
            word_index: HashMap::new(),
            function_index: HashMap::new(),
            language_index: HashMap::new(),
            tag_index: HashMap::new(),
            last_update: DateTime::<Utc>::MIN_UTC,
            document_count: 0,
        }
    }

    /// True iff the index is older than the staleness window / 是否超过过期窗口
    pub fn should_rebuild(&self, max_age_minutes: i64) -> bool {
        Utc::now().signed_duration_since(self.last_update) > Duration::minutes(max_age_minutes)
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn word_count(&self) -> usize {
        self.word_index.len()
    }

    pub fn function_count(&self) -> usize {
        self.function_index.len()
    }

    pub fn language_count(&self) -> usize {
        self.language_index.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tag_index.len()
    }

    /// Most frequent entries of one map by document count / 按文档数取最频繁条目
    pub(crate) fn top_entries(
        map: &HashMap<String, HashSet<String>>,
        limit: usize,
    ) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> =
            map.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }

    /// Build a fresh index from a full corpus scan / 通过全量扫描构建新索引
    ///
    /// Per-document failures are logged and skipped; only a whole-page store
    /// failure (or cancellation) aborts the build.
    pub async fn build(
        store: &dyn DocumentStore,
        extractor: &dyn FunctionExtractor,
        user_id: &str,
        page_size: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self, SearchError> {
        let mut index = Self::empty();
        let page_size = page_size.max(1);
        let mut offset = 0;
        let mut indexed = 0;

        loop {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                return Err(SearchError::Cancelled);
            }

            let page = store
                .list_active_documents(user_id, page_size, offset, DocumentProjection::Full)
                .await
                .map_err(SearchError::Store)?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            for doc in page {
                match index.index_document(extractor, user_id, &doc) {
                    Ok(true) => indexed += 1,
                    Ok(false) => {} // no usable file name, skipped silently
                    Err(e) => {
                        tracing::debug!(user_id, error = %e, "skipping unindexable document");
                    }
                }
            }

            offset += page_len;
            if page_len < page_size {
                break;
            }
        }

        index.last_update = Utc::now();
        index.document_count = indexed;
        Ok(index)
    }

    /// Index one document into all four maps / 将单个文档写入四个映射
    ///
    /// Ok(false) means the document had no usable file name. Extraction
    /// failure only costs the function entries, never the whole document.
    fn index_document(
        &mut self,
        extractor: &dyn FunctionExtractor,
        user_id: &str,
        doc: &StoredDocument,
    ) -> Result<bool> {
        let Some(file_name) = doc.usable_file_name() else {
            return Ok(false);
        };
        let key = document_key(user_id, file_name);

        for token in tokenize(&doc.code) {
            self.word_index.entry(token).or_default().insert(key.clone());
        }

        match extractor.extract_functions(&doc.code, doc.language.as_deref()) {
            Ok(functions) => {
                for function in functions {
                    let name = function.name.trim().to_lowercase();
                    if name.is_empty() {
                        continue;
                    }
                    self.function_index.entry(name).or_default().insert(key.clone());
                }
            }
            Err(e) => {
                // Extraction failure == no functions found / 提取失败视为没有函数
                tracing::debug!(user_id, file_name, error = %e, "function extraction failed");
            }
        }

        if let Some(language) = doc.language.as_deref().map(str::trim) {
            if !language.is_empty() {
                self.language_index
                    .entry(language.to_string())
                    .or_default()
                    .insert(key.clone());
            }
        }

        for tag in &doc.tags {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() {
                continue;
            }
            self.tag_index.entry(tag).or_default().insert(key.clone());
        }

        Ok(true)
    }
}
