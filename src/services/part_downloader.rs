//! 分卷下载服务 - 业务能力层
//!
//! 在表单中选中一个分卷，点击下载，等待浏览器把文件写入下载目录，
//! 然后把文件移动到 `输出目录/地区/子地区/` 下。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::BrowserError;
use crate::models::{AttemptResult, ScopeEntry, WorkItem};
use crate::services::action_executor::ActionExecutor;
use crate::services::form_session::{
    FormField, FormSession, SelectOutcome, PART_FIELD, REGION_FIELD, SUB_REGION_FIELD,
};

/// 浏览器仍在写入的文件后缀
const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".tmp", ".part"];

/// 通过浏览器下载分卷
pub struct PartDownloader {
    form: FormSession,
    download_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    poll_interval: Duration,
}

impl PartDownloader {
    pub fn new(
        form: FormSession,
        download_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            form,
            download_dir: download_dir.into(),
            output_dir: output_dir.into(),
            timeout,
            poll_interval: Duration::from_millis(500),
        }
    }

    async fn try_download(&self, item: &WorkItem) -> Result<AttemptResult, BrowserError> {
        self.form.open().await?;

        for (field, entry) in [
            (&REGION_FIELD, item.region()),
            (&SUB_REGION_FIELD, item.sub_region()),
            (&PART_FIELD, item.part()),
        ] {
            if let Some(failure) = self.choose(field, entry).await? {
                return Ok(failure);
            }
        }

        let before = list_files(&self.download_dir).await;

        let Some(method) = self.form.click_download().await? else {
            return Ok(AttemptResult::failure("未找到下载按钮", false));
        };
        debug!("已点击下载 ({})", method);

        let Some(downloaded) = self.wait_for_download(&before).await else {
            return Ok(AttemptResult::failure(
                format!("等待下载超时 ({} 秒)", self.timeout.as_secs()),
                true,
            ));
        };

        let target_dir = artifact_dir(&self.output_dir, item);
        match move_artifact(&downloaded, &target_dir).await {
            Ok(artifact) => Ok(AttemptResult::success(artifact)),
            Err(e) => Ok(AttemptResult::failure(
                format!("移动下载文件失败 ({}): {}", downloaded.display(), e),
                true,
            )),
        }
    }

    /// 选中选项；选项不可用时返回不可重试的失败
    async fn choose(
        &self,
        field: &FormField,
        entry: &ScopeEntry,
    ) -> Result<Option<AttemptResult>, BrowserError> {
        if !self.form.wait_ready(field).await? {
            warn!("⚠️ {}下拉框未就绪，仍尝试选择", field.label);
        }

        let failure = match self.form.select(field, entry).await? {
            SelectOutcome::Changed | SelectOutcome::Unchanged => None,
            SelectOutcome::MissingField => Some(AttemptResult::failure(
                format!("未找到{}下拉框", field.label),
                false,
            )),
            SelectOutcome::MissingOption => Some(AttemptResult::failure(
                format!("{}下拉框中没有选项: {}", field.label, entry.name),
                false,
            )),
        };
        Ok(failure)
    }

    async fn wait_for_download(&self, before: &HashSet<PathBuf>) -> Option<PathBuf> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let now = list_files(&self.download_dir).await;
            if let Some(path) = new_finished_files(before, &now).into_iter().next() {
                return Some(path);
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ActionExecutor for PartDownloader {
    async fn attempt(&mut self, item: &WorkItem) -> AttemptResult {
        match self.try_download(item).await {
            Ok(result) => {
                if let AttemptResult::Success { artifact } = &result {
                    info!("📥 已保存: {}", artifact.display());
                }
                result
            }
            Err(e) => AttemptResult::failure(e.to_string(), true),
        }
    }
}

/// 替换文件名中不允许出现的字符
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 分卷文件的存放目录：`输出目录/地区/子地区`
pub fn artifact_dir(output_dir: &Path, item: &WorkItem) -> PathBuf {
    output_dir
        .join(sanitize_file_name(&item.region().name))
        .join(sanitize_file_name(&item.sub_region().name))
}

/// 点击下载后新出现且已写完的文件（按路径排序）
pub fn new_finished_files(before: &HashSet<PathBuf>, now: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = now
        .difference(before)
        .filter(|p| !is_partial(p))
        .cloned()
        .collect();
    files.sort();
    files
}

fn is_partial(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

async fn list_files(dir: &Path) -> HashSet<PathBuf> {
    let mut files = HashSet::new();
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            files.insert(entry.path());
        }
    }
    files
}

async fn move_artifact(source: &Path, target_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(target_dir).await?;
    let file_name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "download".into());
    let target = target_dir.join(file_name);

    // 跨文件系统时 rename 会失败，退回复制后删除
    if fs::rename(source, &target).await.is_err() {
        fs::copy(source, &target).await?;
        fs::remove_file(source).await?;
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> WorkItem {
        WorkItem::new(
            ScopeEntry::new("13", "Malda"),
            ScopeEntry::new("44", "Ratua / West"),
            ScopeEntry::new("7", "Part 7"),
        )
    }

    #[test]
    fn file_names_lose_path_separators() {
        assert_eq!(sanitize_file_name("Ratua / West"), "Ratua _ West");
        assert_eq!(sanitize_file_name("a:b*c?"), "a_b_c_");
        assert_eq!(sanitize_file_name(" .. "), "_");
    }

    #[test]
    fn artifacts_are_grouped_by_region_and_sub_region() {
        let dir = artifact_dir(Path::new("out"), &item());
        assert_eq!(dir, Path::new("out").join("Malda").join("Ratua _ West"));
    }

    #[test]
    fn partial_downloads_are_ignored() {
        let before: HashSet<PathBuf> = [PathBuf::from("d/old.pdf")].into();
        let now: HashSet<PathBuf> = [
            PathBuf::from("d/old.pdf"),
            PathBuf::from("d/new.pdf.crdownload"),
            PathBuf::from("d/other.PART"),
        ]
        .into();
        assert!(new_finished_files(&before, &now).is_empty());

        let mut done = now.clone();
        done.insert(PathBuf::from("d/new.pdf"));
        assert_eq!(new_finished_files(&before, &done), vec![PathBuf::from("d/new.pdf")]);
    }

    #[tokio::test]
    async fn moved_artifact_lands_in_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("part7.pdf");
        std::fs::write(&source, b"%PDF").unwrap();

        let target_dir = artifact_dir(&dir.path().join("out"), &item());
        let moved = move_artifact(&source, &target_dir).await.unwrap();

        assert_eq!(moved, target_dir.join("part7.pdf"));
        assert!(moved.exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn listing_a_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("nope")).await.is_empty());
    }
}
