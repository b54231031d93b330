//! Advanced search engine / 高级搜索引擎
//!
//! Holds one inverted index per user, rebuilds it when stale, dispatches to
//! the strategy matching the requested search type, then filters, sorts and
//! truncates. The public surface never fails: every internal error is
//! reported through the event sink and surfaces as an empty result set.
//! / 每用户持有一个倒排索引，过期时重建，按搜索类型分派策略，再过滤、排序、
//! 截断。公共接口永不报错：内部错误通过事件上报，对外表现为空结果。
//!
//! Rebuild rule: build a fresh index off to the side, then swap the Arc in
//! whole. Readers always see either the fully-old or fully-new index; a
//! per-user tokio mutex keeps concurrent stale observers from rebuilding
//! twice. / 重建规则：旁路构建新索引后整体替换，读者只会看到完整的新旧索引之一。

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::RegexBuilder;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::fuzzy::{name_similarity, partial_ratio};
use super::index::{file_name_of_key, SearchIndex};
use super::schema::{
    SearchFilter, SearchMatch, SearchRequest, SearchResult, SearchType, SortOrder,
};
use super::tokenizer::{line_number, tokenize_query};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::events::{EventSink, PhaseTimer, SearchEvent, TracingEventSink};
use crate::store::{
    DocumentProjection, DocumentStore, FunctionExtractor, StoredDocument, VectorSearchProvider,
};

/// TEXT strategy weights / TEXT 策略权重
const EXACT_TOKEN_WEIGHT: f32 = 2.0;
const PARTIAL_TOKEN_WEIGHT: f32 = 1.0;
/// FUNCTION strategy weight per similarity point / FUNCTION 策略相似度权重
const FUNCTION_WEIGHT: f32 = 2.0;
/// CONTENT preview context on each side, in characters / CONTENT 预览两侧的上下文字符数
const PREVIEW_CONTEXT: usize = 50;
/// CONTENT score ceiling / CONTENT 分数上限
const CONTENT_SCORE_CAP: f32 = 10.0;
/// Minimum characters before completions kick in / 补全的最小输入长度
const MIN_COMPLETION_LEN: usize = 2;

/// Top term with its document count / 高频词项及其文档数
#[derive(Debug, Clone, Serialize)]
pub struct TermCount {
    pub term: String,
    pub documents: usize,
}

/// Index population summary / 索引规模摘要
#[derive(Debug, Clone, Serialize)]
pub struct SearchStatistics {
    pub indexed_words: usize,
    pub indexed_functions: usize,
    pub indexed_languages: usize,
    pub indexed_tags: usize,
    pub document_count: usize,
    pub last_update: DateTime<Utc>,
    pub top_words: Vec<TermCount>,
    pub top_languages: Vec<TermCount>,
    pub top_tags: Vec<TermCount>,
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self {
            indexed_words: 0,
            indexed_functions: 0,
            indexed_languages: 0,
            indexed_tags: 0,
            document_count: 0,
            last_update: DateTime::<Utc>::MIN_UTC,
            top_words: Vec::new(),
            top_languages: Vec::new(),
            top_tags: Vec::new(),
        }
    }
}

/// One user's slot in the registry / 注册表中单个用户的槽位
struct UserIndexEntry {
    /// Current complete index, swapped atomically / 当前完整索引，整体替换
    current: RwLock<Arc<SearchIndex>>,
    /// Serializes rebuilds for this user / 串行化该用户的重建
    rebuild_gate: tokio::sync::Mutex<()>,
}

impl UserIndexEntry {
    fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(SearchIndex::empty())),
            rebuild_gate: tokio::sync::Mutex::new(()),
        }
    }
}

/// Multi-strategy per-user search engine / 多策略每用户搜索引擎
pub struct AdvancedSearchEngine {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn FunctionExtractor>,
    vector: Option<Arc<dyn VectorSearchProvider>>,
    events: Arc<dyn EventSink>,
    config: SearchConfig,
    /// user_id -> index slot; the map itself is never exposed / 用户 -> 索引槽位
    indexes: RwLock<HashMap<String, Arc<UserIndexEntry>>>,
}

impl AdvancedSearchEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn FunctionExtractor>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            vector: None,
            events: Arc::new(TracingEventSink),
            config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a vector provider for SEMANTIC mode / 挂接语义搜索提供方
    pub fn with_vector_provider(mut self, provider: Arc<dyn VectorSearchProvider>) -> Self {
        self.vector = Some(provider);
        self
    }

    /// Replace the default tracing event sink / 替换默认事件接收端
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Run one search call. Never fails; failures surface as an empty result
    /// set plus a `search_error` event. / 执行一次搜索，永不报错。
    pub async fn search(&self, user_id: &str, request: SearchRequest) -> Vec<SearchResult> {
        if request.query.trim().is_empty() {
            return Vec::new();
        }

        self.events.emit(SearchEvent::SearchRequest {
            user_id: user_id.to_string(),
            search_type: request.search_type.as_str().to_string(),
            query_len: request.query.chars().count(),
        });
        let started = Instant::now();

        match self.run_search(user_id, &request).await {
            Ok(results) => {
                self.events.emit(SearchEvent::SearchDone {
                    user_id: user_id.to_string(),
                    search_type: request.search_type.as_str().to_string(),
                    results: results.len(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
                results
            }
            Err(e) => {
                self.events.emit(SearchEvent::SearchError {
                    user_id: user_id.to_string(),
                    search_type: request.search_type.as_str().to_string(),
                    error: e.to_string(),
                });
                tracing::warn!(user_id, error = %e, "search failed, returning empty results");
                Vec::new()
            }
        }
    }

    async fn run_search(
        &self,
        user_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let timer = PhaseTimer::start("index_fetch");
        let index = self.index_snapshot(user_id, request.cancel.as_ref()).await?;
        timer.finish();

        let timer = PhaseTimer::start("strategy");
        let mut candidates = match request.search_type {
            SearchType::Text => self.search_text(user_id, &index, &request.query).await?,
            SearchType::Regex => self.search_regex(user_id, request).await?,
            SearchType::Fuzzy => self.search_fuzzy(user_id, request).await?,
            SearchType::Function => self.search_function(user_id, &index, &request.query).await?,
            SearchType::Content => self.search_content(user_id, request).await?,
            SearchType::Semantic => self.search_semantic(user_id, request).await?,
        };
        timer.finish();

        if let Some(filter) = &request.filter {
            let timer = PhaseTimer::start("filter");
            candidates = self.apply_filters(candidates, filter)?;
            timer.finish();
        }

        let timer = PhaseTimer::start("sort");
        sort_results(&mut candidates, request.sort);
        timer.finish();

        candidates.truncate(request.limit.max(1));
        Ok(candidates)
    }

    /// Current index for a user, rebuilt first when stale / 获取（必要时重建）用户索引
    async fn index_snapshot(
        &self,
        user_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Arc<SearchIndex>, SearchError> {
        let entry = {
            let indexes = self.indexes.read();
            indexes.get(user_id).cloned()
        };
        let entry = match entry {
            Some(entry) => entry,
            None => {
                let mut indexes = self.indexes.write();
                indexes
                    .entry(user_id.to_string())
                    .or_insert_with(|| Arc::new(UserIndexEntry::new()))
                    .clone()
            }
        };

        let snapshot = entry.current.read().clone();
        if !snapshot.should_rebuild(self.config.index_max_age_minutes) {
            return Ok(snapshot);
        }

        let _gate = entry.rebuild_gate.lock().await;
        // Another call may have rebuilt while we waited / 等锁期间可能已被重建
        let snapshot = entry.current.read().clone();
        if !snapshot.should_rebuild(self.config.index_max_age_minutes) {
            return Ok(snapshot);
        }

        self.events.emit(SearchEvent::IndexRebuildStart {
            user_id: user_id.to_string(),
        });
        let started = Instant::now();

        let fresh = SearchIndex::build(
            self.store.as_ref(),
            self.extractor.as_ref(),
            user_id,
            self.config.page_size,
            cancel,
        )
        .await?;
        let fresh = Arc::new(fresh);
        *entry.current.write() = fresh.clone();

        self.events.emit(SearchEvent::IndexRebuildDone {
            user_id: user_id.to_string(),
            documents: fresh.document_count(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        Ok(fresh)
    }

    /// TEXT: token match against the word index with prefix/substring
    /// fallback / TEXT：词项精确匹配加前缀/子串回退
    async fn search_text(
        &self,
        user_id: &str,
        index: &SearchIndex,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let tokens = tokenize_query(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<String, f32> = HashMap::new();
        for token in &tokens {
            let exact = index.word_index.get(token);

            let mut docs: HashSet<&String> = HashSet::new();
            if let Some(set) = exact {
                docs.extend(set.iter());
            }
            for (term, set) in &index.word_index {
                if term != token && term.contains(token.as_str()) {
                    docs.extend(set.iter());
                }
            }

            for key in docs {
                let weight = if exact.map_or(false, |set| set.contains(key)) {
                    EXACT_TOKEN_WEIGHT
                } else {
                    PARTIAL_TOKEN_WEIGHT
                };
                *scores.entry(key.clone()).or_insert(0.0) += weight;
            }
        }

        self.hydrate_candidates(user_id, scores).await
    }

    /// FUNCTION: substring match over indexed function names / FUNCTION：函数名子串匹配
    async fn search_function(
        &self,
        user_id: &str,
        index: &SearchIndex,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<String, f32> = HashMap::new();
        for (name, docs) in &index.function_index {
            if !name.contains(&needle) {
                continue;
            }
            let similarity = name_similarity(&needle, name) as f32;
            for key in docs {
                *scores.entry(key.clone()).or_insert(0.0) += similarity * FUNCTION_WEIGHT;
            }
        }

        self.hydrate_candidates(user_id, scores).await
    }

    /// REGEX: case-insensitive multi-line pattern over the full corpus
    /// / REGEX：不区分大小写的多行模式全量扫描
    async fn search_regex(
        &self,
        user_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let pattern = RegexBuilder::new(&request.query)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;

        let max_matches = self.config.max_regex_matches;
        let mut results = Vec::new();
        self.scan_corpus(
            user_id,
            DocumentProjection::Scan,
            request.cancel.as_ref(),
            |doc| {
                let mut matches = Vec::new();
                let mut total = 0usize;
                for m in pattern.find_iter(&doc.code) {
                    total += 1;
                    if matches.len() < max_matches {
                        matches.push(SearchMatch {
                            start: m.start(),
                            end: m.end(),
                            text: m.as_str().to_string(),
                            line: line_number(&doc.code, m.start()),
                        });
                    }
                }
                if total == 0 {
                    return;
                }
                if let Some(mut result) = SearchResult::from_document(doc, total as f32) {
                    result.matches = matches;
                    results.push(result);
                }
            },
        )
        .await?;

        Ok(results)
    }

    /// FUZZY: best partial ratio of name/content/tags, inclusive threshold
    /// / FUZZY：文件名、内容、标签三者取最大相似度，阈值包含
    async fn search_fuzzy(
        &self,
        user_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = request.query.trim().to_string();
        let threshold = self.config.fuzzy_threshold;

        let mut results = Vec::new();
        self.scan_corpus(
            user_id,
            DocumentProjection::Full,
            request.cancel.as_ref(),
            |doc| {
                let name_score = doc
                    .usable_file_name()
                    .map(|name| partial_ratio(&query, name))
                    .unwrap_or(0);
                let content_score = partial_ratio(&query, &doc.code);
                let tag_score = partial_ratio(&query, &doc.tags.join(" "));
                let best = name_score.max(content_score).max(tag_score);
                if best < threshold {
                    return;
                }
                if let Some(result) = SearchResult::from_document(doc, f32::from(best) / 100.0) {
                    results.push(result);
                }
            },
        )
        .await?;

        Ok(results)
    }

    /// CONTENT: case-insensitive literal occurrence count with preview
    /// / CONTENT：不区分大小写的字面量计数加预览
    async fn search_content(
        &self,
        user_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let needle = request.query.trim();
        let literal = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;

        let mut results = Vec::new();
        self.scan_corpus(
            user_id,
            DocumentProjection::Scan,
            request.cancel.as_ref(),
            |doc| {
                let mut occurrences = 0usize;
                let mut first: Option<(usize, usize)> = None;
                for m in literal.find_iter(&doc.code) {
                    occurrences += 1;
                    if first.is_none() {
                        first = Some((m.start(), m.end()));
                    }
                }
                let Some((start, end)) = first else {
                    return;
                };

                let content_len = doc.code.chars().count();
                if content_len == 0 {
                    return;
                }
                let score =
                    (occurrences as f32 / (content_len as f32 / 1000.0)).min(CONTENT_SCORE_CAP);

                let window_start = doc.code[..start]
                    .char_indices()
                    .rev()
                    .take(PREVIEW_CONTEXT)
                    .last()
                    .map(|(i, _)| i)
                    .unwrap_or(start);
                let window_end = doc.code[end..]
                    .char_indices()
                    .nth(PREVIEW_CONTEXT)
                    .map(|(i, _)| end + i)
                    .unwrap_or(doc.code.len());
                let preview = doc.code[window_start..window_end].to_string();
                let highlight = (start - window_start, end - window_start);
                let line = line_number(&doc.code, start);
                let text = doc.code[start..end].to_string();

                if let Some(mut result) = SearchResult::from_document(doc, score) {
                    result.matches = vec![SearchMatch {
                        start,
                        end,
                        text,
                        line,
                    }];
                    result.preview = Some(preview);
                    result.highlights = vec![highlight];
                    results.push(result);
                }
            },
        )
        .await?;

        Ok(results)
    }

    /// SEMANTIC: delegate to the vector provider when enabled / SEMANTIC：
    /// 启用时委托给向量搜索提供方
    async fn search_semantic(
        &self,
        user_id: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if !self.config.semantic_enabled {
            return Err(SearchError::SemanticDisabled);
        }
        let Some(provider) = &self.vector else {
            return Err(SearchError::SemanticDisabled);
        };
        provider
            .semantic_search(user_id, &request.query, request.limit.max(1))
            .await
            .map_err(SearchError::Store)
    }

    /// Page through the user's corpus, visiting every document / 分页遍历用户语料
    async fn scan_corpus<F>(
        &self,
        user_id: &str,
        projection: DocumentProjection,
        cancel: Option<&CancellationToken>,
        mut visit: F,
    ) -> Result<(), SearchError>
    where
        F: FnMut(StoredDocument),
    {
        let page_size = self.config.page_size.max(1);
        let mut offset = 0;
        loop {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                return Err(SearchError::Cancelled);
            }

            let page = self
                .store
                .list_active_documents(user_id, page_size, offset, projection)
                .await
                .map_err(SearchError::Store)?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            for doc in page {
                visit(doc);
            }

            offset += page_len;
            if page_len < page_size {
                break;
            }
        }
        Ok(())
    }

    /// Fetch latest versions for positively-scored document keys / 取回得分为正的文档
    async fn hydrate_candidates(
        &self,
        user_id: &str,
        scores: HashMap<String, f32>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = Vec::new();
        for (key, score) in scores {
            if score <= 0.0 {
                continue;
            }
            let file_name = file_name_of_key(&key);
            let doc = self
                .store
                .get_latest_version(user_id, file_name)
                .await
                .map_err(SearchError::Store)?;
            let Some(doc) = doc else {
                // Index can lag a deletion; missing files just drop out
                // / 索引可能落后于删除，文件缺失直接丢弃
                continue;
            };
            if let Some(result) = SearchResult::from_document(doc, score) {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Keep only candidates satisfying every set constraint / 仅保留满足全部约束的候选
    fn apply_filters(
        &self,
        results: Vec<SearchResult>,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let file_pattern = filter
            .file_pattern
            .as_deref()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| SearchError::InvalidFilePattern(e.to_string()))
            })
            .transpose()?;

        Ok(results
            .into_iter()
            .filter(|r| self.matches_filter(r, filter, file_pattern.as_ref()))
            .collect())
    }

    fn matches_filter(
        &self,
        result: &SearchResult,
        filter: &SearchFilter,
        file_pattern: Option<&regex::Regex>,
    ) -> bool {
        if let Some(languages) = &filter.languages {
            if !languages.is_empty() {
                let Some(language) = result.language.as_deref() else {
                    return false;
                };
                if !languages.iter().any(|l| l.eq_ignore_ascii_case(language)) {
                    return false;
                }
            }
        }

        if let Some(tags) = &filter.tags {
            if !tags.is_empty() {
                let result_tags: HashSet<String> = result
                    .tags
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .collect();
                if !tags
                    .iter()
                    .any(|t| result_tags.contains(&t.trim().to_lowercase()))
                {
                    return false;
                }
            }
        }

        if let Some(from) = filter.date_from {
            if result.updated_at < from {
                return false;
            }
        }
        if let Some(to) = filter.date_to {
            if result.updated_at > to {
                return false;
            }
        }

        if let Some(min) = filter.min_size {
            if result.code.len() < min {
                return false;
            }
        }
        if let Some(max) = filter.max_size {
            if result.code.len() > max {
                return false;
            }
        }

        if let Some(wanted) = filter.has_functions {
            let has = self
                .extractor
                .extract_functions(&result.code, result.language.as_deref())
                .map(|f| !f.is_empty())
                .unwrap_or(false);
            if has != wanted {
                return false;
            }
        }

        if let Some(wanted) = filter.has_classes {
            if result.code.contains("class ") != wanted {
                return false;
            }
        }

        if let Some(pattern) = file_pattern {
            if !pattern.is_match(&result.file_name) {
                return false;
            }
        }

        true
    }

    /// Completion suggestions from index terms / 基于索引词项的补全建议
    ///
    /// Never fails; an unreachable store surfaces as no suggestions.
    pub async fn suggest_completions(
        &self,
        user_id: &str,
        partial_query: &str,
        limit: usize,
    ) -> Vec<String> {
        let partial = partial_query.trim().to_lowercase();
        if partial.chars().count() < MIN_COMPLETION_LEN {
            return Vec::new();
        }

        let index = match self.index_snapshot(user_id, None).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "suggestions unavailable");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();
        let mut push = |candidate: String| {
            if seen.insert(candidate.clone()) {
                suggestions.push(candidate);
            }
        };

        for term in index.word_index.keys() {
            if term.starts_with(&partial) {
                push(term.clone());
            }
        }
        for name in index.function_index.keys() {
            if name.starts_with(&partial) {
                push(name.clone());
            }
        }
        for language in index.language_index.keys() {
            if language.to_lowercase().starts_with(&partial) {
                push(language.clone());
            }
        }
        for tag in index.tag_index.keys() {
            if tag.starts_with(&partial) {
                push(format!("#{}", tag));
            }
        }

        // Shorter suggestions first - they generalize better / 短建议靠前
        suggestions.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        suggestions.truncate(limit);
        suggestions
    }

    /// Index population summary / 索引规模摘要
    ///
    /// Never fails; an unreachable store yields empty statistics.
    pub async fn search_statistics(&self, user_id: &str) -> SearchStatistics {
        let index = match self.index_snapshot(user_id, None).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "statistics unavailable");
                return SearchStatistics::default();
            }
        };

        let top = self.config.top_terms;
        let to_counts = |entries: Vec<(String, usize)>| {
            entries
                .into_iter()
                .map(|(term, documents)| TermCount { term, documents })
                .collect()
        };

        SearchStatistics {
            indexed_words: index.word_count(),
            indexed_functions: index.function_count(),
            indexed_languages: index.language_count(),
            indexed_tags: index.tag_count(),
            document_count: index.document_count(),
            last_update: index.last_update(),
            top_words: to_counts(SearchIndex::top_entries(&index.word_index, top)),
            top_languages: to_counts(SearchIndex::top_entries(&index.language_index, top)),
            top_tags: to_counts(SearchIndex::top_entries(&index.tag_index, top)),
        }
    }
}

/// Order results in place / 原地排序结果
fn sort_results(results: &mut [SearchResult], sort: SortOrder) {
    match sort {
        SortOrder::Relevance => {
            results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        }
        SortOrder::DateAsc => results.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        SortOrder::DateDesc => results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortOrder::NameAsc => results.sort_by(|a, b| {
            a.file_name
                .to_lowercase()
                .cmp(&b.file_name.to_lowercase())
        }),
        SortOrder::NameDesc => results.sort_by(|a, b| {
            b.file_name
                .to_lowercase()
                .cmp(&a.file_name.to_lowercase())
        }),
        SortOrder::SizeAsc => results.sort_by(|a, b| a.code.len().cmp(&b.code.len())),
        SortOrder::SizeDesc => results.sort_by(|a, b| b.code.len().cmp(&a.code.len())),
        SortOrder::Unsorted => {}
    }
}
