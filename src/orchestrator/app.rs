//! 应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源管理与运行装配。
//!
//! 1. **应用初始化**：连接或启动浏览器、配置下载目录、创建 JsExecutor
//! 2. **范围加载**：读取范围缓存文件，或从页面下拉框逐级读取
//! 3. **运行装配**：加载进度文件，选择决策通道，接入 Ctrl+C 中断
//! 4. **全局统计**：输出本次运行与进度文件的汇总
//!
//! 只有本模块持有 Browser。

use std::path::PathBuf;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppResult, ScopeError};
use crate::infrastructure::{JsExecutor, ProgressStore};
use crate::models::{save_scope_file, ScopeModel};
use crate::orchestrator::run_processor::{Orchestrator, RunReport, RunSettings};
use crate::services::{
    discover, ConsolePrompt, DecisionChannel, FixedPolicy, FormScopeReader, FormSession,
    PartDownloader, RegionSelection, TomlScopeProvider,
};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    download_dir: PathBuf,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let (browser, page) = match config.browser_debug_port {
            Some(port) => browser::connect_to_browser_and_page(port, &config.target_url).await?,
            None => {
                browser::launch_browser(
                    &config.target_url,
                    config.headless,
                    config.browser_executable.as_deref(),
                )
                .await?
            }
        };

        // 浏览器只接受绝对路径
        let download_dir = std::path::absolute(&config.download_dir).with_context(|| {
            format!("无法解析下载目录: {}", config.download_dir.display())
        })?;
        browser::enable_downloads(&browser, &download_dir).await?;

        Ok(Self {
            config,
            _browser: browser,
            executor: JsExecutor::new(page),
            download_dir,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunReport> {
        let scope = self.load_scope().await?;
        logging::log_scope_loaded(&scope);

        let items = scope.work_items();
        let store = ProgressStore::load(&self.config.progress_file);

        let downloader = PartDownloader::new(
            self.form(),
            &self.download_dir,
            &self.config.output_dir,
            self.config.download_timeout(),
        );
        let settings = RunSettings {
            pacing: self.config.pacing(),
            max_retries: self.config.max_retries,
        };

        let mut orchestrator = Orchestrator::new(store, downloader, self.decision_channel(), settings)
            .with_shutdown(spawn_interrupt_watch());
        let report = orchestrator.run(&items).await?;

        logging::print_final_stats(
            &report,
            &orchestrator.store().summary(),
            &self.config.log_file,
        );
        Ok(report)
    }

    /// 加载范围
    ///
    /// 配置了范围文件且文件存在时直接读取；否则从页面读取，
    /// 未指定地区时把结果写入范围文件供下次使用。
    async fn load_scope(&self) -> AppResult<ScopeModel> {
        let selection = RegionSelection::from_option(self.config.region.clone());

        let raw = match &self.config.scope_file {
            Some(path) if path.exists() => {
                info!("\n📄 从范围文件读取: {}", path.display());
                let mut provider = TomlScopeProvider::load(path).await.map_err(|e| {
                    ScopeError::ScopeFileInvalid {
                        path: path.clone(),
                        reason: format!("{:#}", e),
                    }
                })?;
                discover(&mut provider, &selection).await?
            }
            cache => {
                info!("\n🗺️ 正在从页面读取范围...");
                let mut reader = FormScopeReader::new(self.form());
                let raw = discover(&mut reader, &selection).await?;

                match cache {
                    Some(path) if selection == RegionSelection::All => {
                        if let Err(e) = save_scope_file(path, &raw).await {
                            warn!("⚠️ 范围缓存写入失败: {:#}", e);
                        }
                    }
                    Some(_) => debug!("只读取了部分地区，不写入范围缓存"),
                    None => {}
                }
                raw
            }
        };

        Ok(ScopeModel::from_raw(raw)?)
    }

    fn form(&self) -> FormSession {
        FormSession::new(
            self.executor.clone(),
            self.config.form_entry_text.clone(),
            self.config.settle(),
        )
    }

    fn decision_channel(&self) -> Box<dyn DecisionChannel> {
        match self.config.failure_policy.fixed_decision() {
            Some(decision) => {
                info!("🤖 无人值守模式：下载失败时自动{}", decision);
                Box::new(FixedPolicy(decision))
            }
            None => Box::new(ConsolePrompt::stdio()),
        }
    }
}

/// 监听 Ctrl+C
///
/// 第一次按下时请求停止（当前分卷处理完后生效），第二次立即退出。
fn spawn_interrupt_watch() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("\n⚠️ 收到 Ctrl+C，当前分卷结束后停止（再按一次立即退出）");
        let _ = tx.send(true);

        if signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 强制退出");
            std::process::exit(130);
        }
    });

    rx
}
