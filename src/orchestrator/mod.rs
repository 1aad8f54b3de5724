//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次完整运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、运行）
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 加载范围（范围文件或页面下拉框）
//! - 选择决策通道，接入 Ctrl+C
//! - 输出全局统计信息
//!
//! ### `run_processor` - 运行处理器
//! - 按顺序遍历所有分卷（Vec<WorkItem>）
//! - 跳过已完成的分卷（断点续传）
//! - 下载之间节流，检查中断信号
//! - 生成 RunReport
//!
//! ## 层次关系
//!
//! ```text
//! app (资源 + 装配)
//!     ↓
//! run_processor (处理 Vec<WorkItem>)
//!     ↓
//! workflow::ItemFlow (处理单个 WorkItem)
//!     ↓
//! services (能力层：表单 / 下载 / 决策 / 节流)
//!     ↓
//! infrastructure (基础设施：JsExecutor、ProgressStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管资源，run_processor 管顺序与续传
//! 2. **资源隔离**：只有编排层持有 Browser 和 ProgressStore
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **可替换**：run_processor 只依赖 `ActionExecutor` / `DecisionChannel` 两个 trait

pub mod app;
pub mod run_processor;

// 重新导出主要类型
pub use app::App;
pub use run_processor::{Orchestrator, RunReport, RunSettings, RunStatus};
