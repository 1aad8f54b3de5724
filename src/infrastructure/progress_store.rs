//! 进度存储 - 基础设施层
//!
//! 持有唯一的进度快照文件。每次变更后整体写入：
//! 先写临时文件并 fsync，再 rename 覆盖正式文件，
//! 因此磁盘上永远不会出现写了一半的快照。

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{ProgressRecord, ProgressSnapshot, ProgressStatus, StoreSummary};

/// 进度存储
///
/// 运行期间由编排器独占；同一路径同一时间只应有一个进程写入。
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    snapshot: ProgressSnapshot,
}

impl ProgressStore {
    /// 加载进度快照
    ///
    /// 文件不存在、无法读取或解析失败时都返回空存储（只记录警告，不中断运行）。
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        remove_stale_temp(&path);

        let snapshot = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<ProgressSnapshot>(&content) {
                Ok(snapshot) => {
                    info!(
                        "📂 已加载进度文件: {} ({} 条记录)",
                        path.display(),
                        snapshot.items.len()
                    );
                    snapshot
                }
                Err(e) => {
                    warn!(
                        "⚠️ 进度文件无法解析，将从头开始: {} ({})",
                        path.display(),
                        e
                    );
                    ProgressSnapshot::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("⚠️ 未找到进度文件，将从头开始: {}", path.display());
                ProgressSnapshot::default()
            }
            Err(e) => {
                warn!(
                    "⚠️ 进度文件无法读取，将从头开始: {} ({})",
                    path.display(),
                    e
                );
                ProgressSnapshot::default()
            }
        };

        Self { path, snapshot }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&ProgressRecord> {
        self.snapshot.items.get(key)
    }

    /// 没有记录即视为 `Pending`
    pub fn status(&self, key: &str) -> ProgressStatus {
        self.get(key).map(|r| r.status).unwrap_or_default()
    }

    pub fn is_done(&self, key: &str) -> bool {
        self.status(key) == ProgressStatus::Done
    }

    pub fn len(&self) -> usize {
        self.snapshot.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.items.is_empty()
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary::from_records(self.snapshot.items.values())
    }

    /// 创建或更新记录，并同步写盘
    ///
    /// - `InProgress` 表示一次新的尝试开始，`attempts` 加一
    /// - 已完成的记录不会被改成其他状态
    /// - 写盘失败时内存状态回滚，与磁盘保持一致
    pub fn record(
        &mut self,
        key: &str,
        status: ProgressStatus,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        if self.is_done(key) && status != ProgressStatus::Done {
            warn!("⚠️ {} 已完成，忽略状态变更: {}", key, status);
            return Ok(());
        }

        let now = Utc::now();
        let previous = self.snapshot.items.get(key).cloned();

        let record = self
            .snapshot
            .items
            .entry(key.to_string())
            .or_insert_with(|| ProgressRecord::new(now));
        if status == ProgressStatus::InProgress {
            record.attempts += 1;
        }
        record.status = status;
        record.last_error = error;
        record.updated_at = now;

        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => {
                    self.snapshot.items.insert(key.to_string(), previous);
                }
                None => {
                    self.snapshot.items.remove(key);
                }
            }
            return Err(e);
        }

        debug!("进度已保存: {} → {}", key, status);
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.snapshot)?;
        write_atomic(&self.path, content.as_bytes())
    }
}

/// 临时文件路径：`<文件名>.tmp`，与正式文件位于同一目录以保证 rename 原子
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("progress"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::persist(parent, e))?;
    }

    let tmp = temp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::persist(&tmp, e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::persist(path, e)
    })
}

/// 清理上次中断写入遗留的临时文件
fn remove_stale_temp(path: &Path) {
    let tmp = temp_path(path);
    if tmp.exists() {
        debug!("删除中断写入遗留的临时文件: {}", tmp.display());
        let _ = fs::remove_file(&tmp);
    }
}
