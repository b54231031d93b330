//! Engine configuration / 引擎配置
//!
//! Plain serde struct with JSON load/save helpers; embedders usually build
//! it in code and only ship a file when operators need to tune the staleness
//! window. / 普通 serde 结构体，提供 JSON 读写辅助函数。

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Search engine configuration / 搜索引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size for corpus scans / 分页扫描的页大小
    pub page_size: usize,
    /// Index staleness window in minutes / 索引过期时间（分钟）
    pub index_max_age_minutes: i64,
    /// Enable SEMANTIC mode (requires a vector provider) / 是否启用语义搜索
    pub semantic_enabled: bool,
    /// Max recorded match descriptors per REGEX result / 每个结果记录的最大匹配数
    pub max_regex_matches: usize,
    /// Inclusive FUZZY inclusion threshold (0-100) / 模糊匹配阈值（包含）
    pub fuzzy_threshold: u8,
    /// Entries reported per bucket by statistics / 统计信息每类返回的条目数
    pub top_terms: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            index_max_age_minutes: 30,
            semantic_enabled: false,
            max_regex_matches: 10,
            fuzzy_threshold: 60,
            top_terms: 10,
        }
    }
}

/// Load configuration from a JSON file / 从 JSON 文件加载配置
pub fn load_config(path: &Path) -> Result<SearchConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: SearchConfig = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse config file: {}", e))?;

    tracing::info!("Loaded search configuration from {:?}", path);
    Ok(config)
}

/// Save configuration to a JSON file / 保存配置到 JSON 文件
pub fn save_config(config: &SearchConfig, path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}
