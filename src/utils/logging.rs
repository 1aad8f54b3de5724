//! 日志工具模块
//!
//! 初始化日志输出（终端 + 日志文件），并提供格式化输出的辅助函数

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::models::{ScopeModel, StoreSummary};
use crate::orchestrator::RunReport;

/// 初始化日志
///
/// 同时输出到终端与日志文件（追加写入，文件中不含颜色控制符）。
/// `RUST_LOG` 优先；未设置时为 `info`，`verbose` 时为 `debug`。
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `verbose`: 是否输出调试日志
pub fn init(log_file_path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;
    write!(
        file,
        "\n{}\n下载日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    )?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("part_harvest={default_level},warn"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 分卷下载模式");
    info!("🌐 目标页面: {}", config.target_url);
    info!("📁 输出目录: {}", config.output_dir.display());
    info!("📒 进度文件: {}", config.progress_file.display());
    info!(
        "⏱️ 下载间隔: {} 秒, 最多重试: {} 次, 失败处理: {:?}",
        config.pacing_secs, config.max_retries, config.failure_policy
    );
    info!("{}", "=".repeat(60));
}

/// 记录范围加载信息
pub fn log_scope_loaded(model: &ScopeModel) {
    info!(
        "✓ 范围已加载: {} 个地区, {} 个子地区, {} 个分卷",
        model.region_count(),
        model.sub_region_count(),
        model.part_count()
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 本次运行结果
/// - `summary`: 进度文件中的全部记录（含以往运行）
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &RunReport, summary: &StoreSummary, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 下载统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 本次完成: {}/{}", report.completed, report.total);
    info!("📦 此前已完成: {}", report.already_done);
    info!("⏭️ 跳过: {}", report.skipped);
    info!("⏸️ 未处理: {}", report.not_reached());
    if let Some(key) = &report.aborted_at {
        info!("🛑 中止于: {}", key);
    }
    info!(
        "📒 进度文件累计: 完成 {}, 跳过 {}, 失败 {}, 进行中 {}",
        summary.done, summary.skipped, summary.failed, summary.in_progress
    );
    info!("{}", "=".repeat(60));
    info!("进度已保存至: {}", report.store_path.display());
    info!("日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
