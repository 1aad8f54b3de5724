//! 命令行参数
//!
//! 命令行参数覆盖环境变量与默认值。

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, FailurePolicy};

#[derive(Parser, Debug, Default)]
#[command(
    name = "part-harvest",
    about = "按 地区 / 子地区 / 分卷 逐个下载文件，支持断点续传与人工处理失败",
    version
)]
pub struct Cli {
    /// 只处理名称匹配的地区（默认处理全部地区）
    #[arg(short, long)]
    pub region: Option<String>,

    /// 进度文件路径
    #[arg(long)]
    pub progress_file: Option<PathBuf>,

    /// 下载文件存放目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 浏览器下载目录
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// 范围缓存文件（TOML）；存在时不再从页面读取范围
    #[arg(long)]
    pub scope_file: Option<PathBuf>,

    /// 下载失败时的处理方式
    #[arg(long, value_enum)]
    pub on_failure: Option<FailurePolicy>,

    /// 两次下载之间的间隔（秒）
    #[arg(long)]
    pub pacing_secs: Option<u64>,

    /// 单个分卷最多重试次数
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// 等待单个文件下载完成的时间（秒）
    #[arg(long)]
    pub download_timeout_secs: Option<u64>,

    /// 无头模式启动浏览器（无法人工完成验证）
    #[arg(long)]
    pub headless: bool,

    /// 连接已打开调试端口的浏览器，而不是启动新浏览器
    #[arg(long)]
    pub debug_port: Option<u16>,

    /// 日志文件路径
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 把命令行参数叠加到配置上
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(region) = self.region {
            config.region = Some(region);
        }
        if let Some(path) = self.progress_file {
            config.progress_file = path;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.download_dir {
            config.download_dir = dir;
        }
        if let Some(path) = self.scope_file {
            config.scope_file = Some(path);
        }
        if let Some(policy) = self.on_failure {
            config.failure_policy = policy;
        }
        if let Some(secs) = self.pacing_secs {
            config.pacing_secs = secs;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(secs) = self.download_timeout_secs {
            config.download_timeout_secs = secs;
        }
        if let Some(port) = self.debug_port {
            config.browser_debug_port = Some(port);
        }
        if let Some(path) = self.log_file {
            config.log_file = path;
        }
        config.headless |= self.headless;
        config.verbose_logging |= self.verbose;
        config
    }
}
