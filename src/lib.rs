pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod search;
pub mod store;

pub use config::SearchConfig;
pub use error::SearchError;
pub use events::{EventSink, SearchEvent, TracingEventSink};
pub use extract::RegexFunctionExtractor;
pub use search::{
    AdvancedSearchEngine, SearchFilter, SearchRequest, SearchResult, SearchStatistics,
    SearchType, SortOrder,
};
pub use store::{
    normalize_version, DocumentStore, ExtractedFunction, FunctionExtractor,
    MemoryDocumentStore, StoredDocument, VectorSearchProvider,
};
