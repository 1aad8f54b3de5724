//! # Part Harvest
//!
//! 按 地区 / 子地区 / 分卷 三级结构逐个下载文件的 Rust 应用程序。
//! 进度逐条落盘，中断后可以断点续传；下载失败时由操作员决定重试、跳过还是中止。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() / wait_until() 能力
//! - `ProgressStore` - 唯一的进度文件 owner，原子写盘
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ScopeProvider` - 列出地区 / 子地区 / 分卷（页面下拉框或范围文件）
//! - `ActionExecutor` - 下载单个分卷（`PartDownloader`）
//! - `DecisionChannel` - 失败后询问决策（终端提示或固定策略）
//! - `Pacer` - 下载之间节流
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分卷"的完整处理流程
//! - `ItemCtx` - 上下文封装（分卷 + 序号）
//! - `ItemFlow` - 流程编排（尝试 → 记录 → 决策）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 管理浏览器资源，加载范围，装配一次运行
//! - `orchestrator/run_processor` - 遍历分卷列表，续传、节流、中断
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use cli::Cli;
pub use config::{Config, FailurePolicy};
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, ProgressStore};
pub use models::{AttemptResult, RunDecision, ScopeModel, WorkItem};
pub use orchestrator::{App, Orchestrator, RunReport, RunSettings, RunStatus};
pub use workflow::{ItemCtx, ItemFlow, ItemOutcome};
