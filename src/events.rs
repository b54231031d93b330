//! Structured search events / 结构化搜索事件
//!
//! Fire-and-forget: the sink is infallible by construction, so a broken
//! metrics backend can never affect search behaviour. The default sink
//! forwards everything through `tracing`. / 只发不等：事件接收端不可失败，
//! 默认实现转发到 tracing。

use serde::Serialize;
use std::time::Instant;

/// Named engine events / 命名的引擎事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    SearchRequest {
        user_id: String,
        search_type: String,
        query_len: usize,
    },
    SearchDone {
        user_id: String,
        search_type: String,
        results: usize,
        elapsed_ms: u64,
    },
    SearchError {
        user_id: String,
        search_type: String,
        error: String,
    },
    IndexRebuildStart {
        user_id: String,
    },
    IndexRebuildDone {
        user_id: String,
        documents: usize,
        elapsed_ms: u64,
    },
}

impl SearchEvent {
    /// Event name as emitted to sinks / 事件名称
    pub fn name(&self) -> &'static str {
        match self {
            SearchEvent::SearchRequest { .. } => "search_request",
            SearchEvent::SearchDone { .. } => "search_done",
            SearchEvent::SearchError { .. } => "search_error",
            SearchEvent::IndexRebuildStart { .. } => "index_rebuild_start",
            SearchEvent::IndexRebuildDone { .. } => "index_rebuild_done",
        }
    }
}

/// Event/metrics sink / 事件与指标接收端
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SearchEvent);
}

/// Default sink: structured events through tracing / 默认实现：转发到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: SearchEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        match &event {
            SearchEvent::SearchError { .. } => {
                tracing::warn!(event = event.name(), %payload, "search event");
            }
            _ => {
                tracing::info!(event = event.name(), %payload, "search event");
            }
        }
    }
}

/// Timer around one phase of a search call / 一次搜索调用中单个阶段的计时器
///
/// Emits a debug span-like record when finished; dropping without `finish`
/// records nothing, matching the fire-and-forget contract.
pub struct PhaseTimer {
    phase: &'static str,
    started: Instant,
}

impl PhaseTimer {
    pub fn start(phase: &'static str) -> Self {
        Self {
            phase,
            started: Instant::now(),
        }
    }

    /// Log elapsed time and return it in milliseconds / 记录耗时并返回毫秒数
    pub fn finish(self) -> u64 {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        tracing::debug!(phase = self.phase, elapsed_ms, "search phase finished");
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = SearchEvent::SearchRequest {
            user_id: "u1".to_string(),
            search_type: "text".to_string(),
            query_len: 5,
        };
        assert_eq!(event.name(), "search_request");

        let event = SearchEvent::IndexRebuildDone {
            user_id: "u1".to_string(),
            documents: 3,
            elapsed_ms: 12,
        };
        assert_eq!(event.name(), "index_rebuild_done");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = SearchEvent::SearchError {
            user_id: "u1".to_string(),
            search_type: "regex".to_string(),
            error: "bad pattern".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"search_error""#));
    }

    #[test]
    fn test_phase_timer_returns_elapsed() {
        let timer = PhaseTimer::start("strategy");
        let _ = timer.finish();
    }
}
