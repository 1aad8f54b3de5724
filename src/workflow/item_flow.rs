//! 分卷处理流程 - 流程层
//!
//! 核心职责：定义"一个分卷"的完整处理流程
//!
//! 流程顺序：
//! 1. 已完成 → 直接返回
//! 2. 记录 in_progress → 调用执行器
//! 3. 成功 → 记录 done
//! 4. 失败 → 记录 failed → 询问决策（重试 / 跳过 / 中止）

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::infrastructure::ProgressStore;
use crate::models::{AttemptResult, ProgressStatus, RunDecision};
use crate::services::{ActionExecutor, DecisionChannel};
use crate::workflow::item_ctx::ItemCtx;

/// 单个分卷的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 本次运行中下载成功
    Completed { artifact: PathBuf },
    /// 之前的运行已经完成，未做任何尝试
    AlreadyDone,
    /// 已跳过
    Skipped,
    /// 操作员选择中止，整个运行结束
    Aborted,
    /// 收到中断信号，整个运行结束
    Interrupted,
}

impl ItemOutcome {
    /// 是否调用过执行器（决定下一个分卷前是否需要节流等待）
    pub fn attempted(&self) -> bool {
        !matches!(self, ItemOutcome::AlreadyDone)
    }
}

/// 分卷处理流程
///
/// - 决定何时尝试、何时询问、何时放弃
/// - 不持有任何资源，执行器与决策通道由编排层注入
pub struct ItemFlow {
    max_retries: u32,
}

impl ItemFlow {
    /// # 参数
    /// - `max_retries`: 单个分卷在一次运行中最多重试的次数，用尽后强制跳过
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub async fn run<E, D>(
        &self,
        store: &mut ProgressStore,
        executor: &mut E,
        decisions: &mut D,
        ctx: &ItemCtx<'_>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Result<ItemOutcome, StoreError>
    where
        E: ActionExecutor + ?Sized,
        D: DecisionChannel + ?Sized,
    {
        let key = ctx.key();

        if store.is_done(key) {
            info!("{} ✓ 已完成，跳过", ctx);
            return Ok(ItemOutcome::AlreadyDone);
        }

        let mut retries = 0u32;

        loop {
            store.record(key, ProgressStatus::InProgress, None)?;
            info!("{} 📥 开始下载 (第 {} 次尝试)", ctx, retries + 1);

            let (reason, retryable) = match executor.attempt(ctx.item).await {
                AttemptResult::Success { artifact } => {
                    store.record(key, ProgressStatus::Done, None)?;
                    info!("{} ✅ 下载完成", ctx);
                    return Ok(ItemOutcome::Completed { artifact });
                }
                AttemptResult::Failure { reason, retryable } => (reason, retryable),
            };

            store.record(key, ProgressStatus::Failed, Some(reason.clone()))?;
            warn!("{} ❌ 下载失败: {}", ctx, reason);

            if shutdown.is_some_and(|rx| *rx.borrow()) {
                return Ok(ItemOutcome::Interrupted);
            }

            let decision = match decisions.decide(ctx.item, &reason, retryable).await {
                RunDecision::Retry if retries >= self.max_retries => {
                    warn!(
                        "{} ⚠️ 已重试 {} 次，达到上限，强制跳过",
                        ctx, self.max_retries
                    );
                    RunDecision::Skip
                }
                decision => decision,
            };

            match decision {
                RunDecision::Retry => {
                    retries += 1;
                    info!("{} 🔁 重试", ctx);
                }
                RunDecision::Skip => {
                    store.record(key, ProgressStatus::Skipped, Some(reason))?;
                    info!("{} ⏭️ 已跳过", ctx);
                    return Ok(ItemOutcome::Skipped);
                }
                RunDecision::Abort => {
                    info!("{} 🛑 操作员选择中止", ctx);
                    return Ok(ItemOutcome::Aborted);
                }
            }
        }
    }
}
