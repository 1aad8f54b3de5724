use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 当前快照格式版本
pub const SNAPSHOT_VERSION: u32 = 1;

/// 单个分卷的下载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// 尚未尝试（存储中没有记录时的默认值）
    #[default]
    Pending,
    /// 正在尝试（若进程在此状态下退出，下次运行会重新尝试）
    InProgress,
    /// 已完成，终态
    Done,
    Failed,
    Skipped,
}

impl ProgressStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProgressStatus::Pending => "待处理",
            ProgressStatus::InProgress => "进行中",
            ProgressStatus::Done => "已完成",
            ProgressStatus::Failed => "失败",
            ProgressStatus::Skipped => "已跳过",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 单个分卷的进度记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub status: ProgressStatus,
    /// 执行器被调用的次数，只增不减
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: ProgressStatus::Pending,
            attempts: 0,
            last_error: None,
            updated_at: now,
        }
    }
}

/// 磁盘上的进度快照
///
/// ```json
/// { "version": 1, "items": { "地区/子地区/分卷": { "status": "done", ... } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub version: u32,
    #[serde(default)]
    pub items: BTreeMap<String, ProgressRecord>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            items: BTreeMap::new(),
        }
    }
}

/// 按状态统计的记录数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub in_progress: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StoreSummary {
    pub fn from_records<'a>(records: impl Iterator<Item = &'a ProgressRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                ProgressStatus::Pending => {}
                ProgressStatus::InProgress => summary.in_progress += 1,
                ProgressStatus::Done => summary.done += 1,
                ProgressStatus::Failed => summary.failed += 1,
                ProgressStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}
