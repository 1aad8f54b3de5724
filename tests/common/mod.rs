#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::watch;

use part_harvest::infrastructure::ProgressStore;
use part_harvest::models::{RawRegion, RawSubRegion, ScopeEntry, ScopeModel};
use part_harvest::services::{ActionExecutor, DecisionChannel};
use part_harvest::{AttemptResult, RunDecision, WorkItem};

/// 按 地区 → 子地区 → 分卷 名称构建原始范围
pub fn raw_scope(regions: &[(&str, &[(&str, &[&str])])]) -> Vec<RawRegion> {
    regions
        .iter()
        .map(|(region, subs)| RawRegion {
            entry: ScopeEntry::named(*region),
            sub_regions: subs
                .iter()
                .map(|(sub, parts)| RawSubRegion {
                    entry: ScopeEntry::named(*sub),
                    parts: parts.iter().map(|p| ScopeEntry::named(*p)).collect(),
                })
                .collect(),
        })
        .collect()
}

/// A → X, Y → 1, 2
pub fn example_items() -> Vec<WorkItem> {
    let model = ScopeModel::from_raw(raw_scope(&[(
        "A",
        &[("X", &["1", "2"]), ("Y", &["1", "2"])],
    )]))
    .expect("范围应当合法");
    model.work_items()
}

pub fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("progress.json")
}

pub fn load_store(path: &Path) -> ProgressStore {
    ProgressStore::load(path)
}

/// 按分卷脚本返回结果的执行器；没有脚本时一律成功
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: HashMap<String, VecDeque<AttemptResult>>,
    pub calls: Vec<String>,
    /// 第 n 次调用结束时发出中断信号
    interrupt_after: Option<(usize, watch::Sender<bool>)>,
    /// 第 n 次调用结束时在临时文件位置建目录，之后的写入都会失败
    break_store_after: Option<(usize, PathBuf)>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, key: &str, results: Vec<AttemptResult>) -> Self {
        self.scripts.insert(key.to_string(), results.into());
        self
    }

    pub fn interrupt_after(mut self, calls: usize, tx: watch::Sender<bool>) -> Self {
        self.interrupt_after = Some((calls, tx));
        self
    }

    pub fn break_store_after(mut self, calls: usize, store_path: &Path) -> Self {
        let mut name = store_path.file_name().unwrap().to_os_string();
        name.push(".tmp");
        self.break_store_after = Some((calls, store_path.with_file_name(name)));
        self
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls.iter().filter(|k| k.as_str() == key).count()
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn attempt(&mut self, item: &WorkItem) -> AttemptResult {
        self.calls.push(item.key().to_string());

        if let Some((n, tx)) = &self.interrupt_after {
            if self.calls.len() == *n {
                let _ = tx.send(true);
            }
        }

        if let Some((n, tmp)) = &self.break_store_after {
            if self.calls.len() == *n {
                std::fs::create_dir_all(tmp).unwrap();
            }
        }

        self.scripts
            .get_mut(item.key())
            .and_then(|results| results.pop_front())
            .unwrap_or_else(|| AttemptResult::success(format!("out/{}.pdf", item.key())))
    }
}

/// 按顺序给出预设决策；用完后一律跳过
#[derive(Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<RunDecision>,
    pub asked: Vec<(String, String, bool)>,
}

impl ScriptedDecisions {
    pub fn new(answers: Vec<RunDecision>) -> Self {
        Self {
            answers: answers.into(),
            asked: Vec::new(),
        }
    }
}

#[async_trait]
impl DecisionChannel for ScriptedDecisions {
    async fn decide(&mut self, item: &WorkItem, reason: &str, retryable: bool) -> RunDecision {
        self.asked
            .push((item.key().to_string(), reason.to_string(), retryable));
        self.answers.pop_front().unwrap_or(RunDecision::Skip)
    }
}
