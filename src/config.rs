use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::ConfigError;
use crate::models::RunDecision;

/// 下载失败时如何决策
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicy {
    /// 在终端询问操作员
    Prompt,
    /// 自动跳过
    Skip,
    /// 自动重试（受最大重试次数限制）
    Retry,
    /// 立即中止
    Abort,
}

impl FailurePolicy {
    /// 无人值守策略对应的固定决策；`Prompt` 返回 `None`
    pub fn fixed_decision(self) -> Option<RunDecision> {
        match self {
            FailurePolicy::Prompt => None,
            FailurePolicy::Skip => Some(RunDecision::Skip),
            FailurePolicy::Retry => Some(RunDecision::Retry),
            FailurePolicy::Abort => Some(RunDecision::Abort),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 下载页面 URL
    pub target_url: String,
    /// 打开下载表单的按钮文字
    pub form_entry_text: String,
    /// 浏览器调试端口；设置后连接已打开的浏览器，否则启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub browser_executable: Option<PathBuf>,
    /// 启动新浏览器时是否无头运行
    pub headless: bool,
    /// 分卷文件最终存放目录
    pub output_dir: PathBuf,
    /// 浏览器下载目录（文件落地后再移动到 output_dir）
    pub download_dir: PathBuf,
    /// 进度文件
    pub progress_file: PathBuf,
    /// 范围缓存文件；存在时直接读取，否则从页面读取后写入
    pub scope_file: Option<PathBuf>,
    /// 只处理名称匹配的地区
    pub region: Option<String>,
    pub failure_policy: FailurePolicy,
    /// 两次下载之间的间隔（秒）
    pub pacing_secs: u64,
    /// 单个分卷最多重试次数
    pub max_retries: u32,
    /// 等待单个文件下载完成的时间（秒）
    pub download_timeout_secs: u64,
    /// 下拉框联动刷新的等待时间（毫秒）
    pub settle_millis: u64,
    /// 日志文件
    pub log_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://ceowestbengal.wb.gov.in/asd_sir".to_string(),
            form_entry_text: "Download ASDD list by Assembly Constituency".to_string(),
            browser_debug_port: None,
            browser_executable: None,
            headless: false,
            output_dir: PathBuf::from("asdd_data"),
            download_dir: PathBuf::from("asdd_data/.incoming"),
            progress_file: PathBuf::from("asdd_data/download_progress.json"),
            scope_file: None,
            region: None,
            failure_policy: FailurePolicy::Prompt,
            pacing_secs: 10,
            max_retries: 3,
            download_timeout_secs: 120,
            settle_millis: 2000,
            log_file: PathBuf::from("harvest.log"),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    ///
    /// 值无法解析时返回 `ConfigError`，不会悄悄回退到默认值。
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            target_url: env::var("TARGET_URL").unwrap_or(default.target_url),
            form_entry_text: env::var("FORM_ENTRY_TEXT").unwrap_or(default.form_entry_text),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", "u16")?
                .or(default.browser_debug_port),
            browser_executable: env_path("BROWSER_EXECUTABLE").or(default.browser_executable),
            headless: env_parse("HEADLESS", "bool")?.unwrap_or(default.headless),
            output_dir: env_path("OUTPUT_DIR").unwrap_or(default.output_dir),
            download_dir: env_path("DOWNLOAD_DIR").unwrap_or(default.download_dir),
            progress_file: env_path("PROGRESS_FILE").unwrap_or(default.progress_file),
            scope_file: env_path("SCOPE_FILE").or(default.scope_file),
            region: env::var("REGION").ok().or(default.region),
            failure_policy: env_parse("ON_FAILURE", "prompt|skip|retry|abort")?
                .unwrap_or(default.failure_policy),
            pacing_secs: env_parse("PACING_SECS", "u64")?.unwrap_or(default.pacing_secs),
            max_retries: env_parse("MAX_RETRIES", "u32")?.unwrap_or(default.max_retries),
            download_timeout_secs: env_parse("DOWNLOAD_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.download_timeout_secs),
            settle_millis: env_parse("SETTLE_MILLIS", "u64")?.unwrap_or(default.settle_millis),
            log_file: env_path("LOG_FILE").unwrap_or(default.log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
        })
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

fn env_path(var_name: &str) -> Option<PathBuf> {
    env::var_os(var_name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var_name) {
        Ok(value) => parse_value(var_name, &value, expected_type).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
