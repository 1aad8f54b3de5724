//! 运行处理器 - 编排层
//!
//! ## 职责
//!
//! 按范围顺序逐个处理分卷，是一次运行的"指挥中心"：
//!
//! 1. **断点续传**：跳过进度文件中已完成的分卷，不做任何尝试
//! 2. **逐个处理**：委托 `ItemFlow` 处理单个分卷（尝试 → 决策）
//! 3. **节流**：每完成一次下载后等待固定间隔
//! 4. **中断**：每个分卷开始前与节流期间检查中断信号
//! 5. **统计**：汇总本次运行的结果
//!
//! 同一时间只处理一个分卷，只会有一个待决策的失败。

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::infrastructure::ProgressStore;
use crate::models::WorkItem;
use crate::services::{ActionExecutor, DecisionChannel, PaceOutcome, Pacer};
use crate::workflow::{ItemCtx, ItemFlow, ItemOutcome};

/// 运行参数
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// 两次下载之间的等待间隔
    pub pacing: Duration,
    /// 单个分卷最多重试次数
    pub max_retries: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            pacing: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

/// 运行结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 所有分卷都已处理（完成、已完成或跳过）
    Finished,
    /// 操作员中止
    Aborted,
    /// 收到中断信号
    Interrupted,
}

/// 一次运行的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub already_done: usize,
    pub completed: usize,
    pub skipped: usize,
    /// 中止时正在处理的分卷
    pub aborted_at: Option<String>,
    pub status: RunStatus,
    pub store_path: PathBuf,
}

impl RunReport {
    /// 未处理到的分卷数
    pub fn not_reached(&self) -> usize {
        self.total
            .saturating_sub(self.already_done + self.completed + self.skipped)
    }

    /// 进程退出码：正常 0，中止 2，中断 130
    pub fn exit_code(&self) -> u8 {
        match self.status {
            RunStatus::Finished => 0,
            RunStatus::Aborted => 2,
            RunStatus::Interrupted => 130,
        }
    }
}

/// 编排器
///
/// 持有进度存储，执行器与决策通道由调用方注入。
pub struct Orchestrator<E, D> {
    store: ProgressStore,
    executor: E,
    decisions: D,
    flow: ItemFlow,
    pacer: Pacer,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<E, D> Orchestrator<E, D>
where
    E: ActionExecutor,
    D: DecisionChannel,
{
    pub fn new(store: ProgressStore, executor: E, decisions: D, settings: RunSettings) -> Self {
        Self {
            store,
            executor,
            decisions,
            flow: ItemFlow::new(settings.max_retries),
            pacer: Pacer::new(settings.pacing),
            shutdown: None,
        }
    }

    /// 接入中断信号（值变为 `true` 即请求停止）
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn decisions(&self) -> &D {
        &self.decisions
    }

    /// 按顺序处理所有分卷
    ///
    /// 只有进度写盘失败会返回错误；中止与中断体现在 `RunReport::status` 中。
    pub async fn run(&mut self, items: &[WorkItem]) -> Result<RunReport, StoreError> {
        let total = items.len();
        let mut report = RunReport {
            total,
            already_done: 0,
            completed: 0,
            skipped: 0,
            aborted_at: None,
            status: RunStatus::Finished,
            store_path: self.store.path().to_path_buf(),
        };

        log_run_start(total, self.store.len());

        // 上一个分卷调用过执行器时，下一次尝试前需要节流
        let mut pace_before_next = false;

        for (idx, item) in items.iter().enumerate() {
            if self.interrupted() {
                report.status = RunStatus::Interrupted;
                break;
            }

            let ctx = ItemCtx::new(item, idx + 1, total);

            if pace_before_next && !self.store.is_done(item.key()) {
                pace_before_next = false;
                if self.pacer.wait(self.shutdown.as_mut()).await == PaceOutcome::Interrupted {
                    report.status = RunStatus::Interrupted;
                    break;
                }
            }

            let outcome = self
                .flow
                .run(
                    &mut self.store,
                    &mut self.executor,
                    &mut self.decisions,
                    &ctx,
                    self.shutdown.as_ref(),
                )
                .await?;

            if outcome.attempted() {
                pace_before_next = true;
            }

            match outcome {
                ItemOutcome::AlreadyDone => report.already_done += 1,
                ItemOutcome::Completed { .. } => report.completed += 1,
                ItemOutcome::Skipped => report.skipped += 1,
                ItemOutcome::Aborted => {
                    report.aborted_at = Some(item.key().to_string());
                    report.status = RunStatus::Aborted;
                    break;
                }
                ItemOutcome::Interrupted => {
                    report.status = RunStatus::Interrupted;
                    break;
                }
            }
        }

        log_run_end(&report);
        Ok(report)
    }

    fn interrupted(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(total: usize, known: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理 {} 个分卷 (进度文件中已有 {} 条记录)", total, known);
    info!("{}", "=".repeat(60));
}

fn log_run_end(report: &RunReport) {
    info!("\n{}", "─".repeat(60));
    match report.status {
        RunStatus::Finished => info!("✓ 本次运行结束"),
        RunStatus::Aborted => info!(
            "🛑 已按操作员要求中止 (停在 {})",
            report.aborted_at.as_deref().unwrap_or("-")
        ),
        RunStatus::Interrupted => warn!("⚠️ 收到中断信号，运行已停止，进度已保存"),
    }
    info!("{}", "─".repeat(60));
}
