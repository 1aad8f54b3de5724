use std::path::PathBuf;

use thiserror::Error;

use crate::models::NodeKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 范围（地区 / 子地区 / 分卷）错误
    #[error("范围错误: {0}")]
    Scope(#[from] ScopeError),
    /// 进度存储错误
    #[error("进度存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        source: chromiumoxide::error::CdpError,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {reason}")]
    LaunchFailed { reason: String },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        source: chromiumoxide::error::CdpError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        source: chromiumoxide::error::CdpError,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    ScriptExecutionFailed(#[from] chromiumoxide::error::CdpError),
    /// 脚本返回值无法解析
    #[error("脚本返回值解析失败: {0}")]
    ResultDecodeFailed(#[from] serde_json::Error),
    /// 浏览器配置失败
    #[error("浏览器配置失败: {reason}")]
    ConfigurationFailed { reason: String },
}

/// 范围错误
///
/// `EnumerationUnavailable` 只影响出错的子树，其余变体说明整个范围不可信，
/// 本次运行必须终止。
#[derive(Debug, Error)]
pub enum ScopeError {
    /// 无法读取某个父节点下的子节点列表
    #[error("无法获取 {parent} 的子项: {reason}")]
    EnumerationUnavailable { parent: String, reason: String },
    /// 地区或子地区没有任何子项
    #[error("{kind} {name} 没有任何子项")]
    EmptyScope { kind: NodeKind, name: String },
    /// 同一父节点下出现重名子项
    #[error("{parent} 下存在重名子项: {name}")]
    DuplicateName { parent: String, name: String },
    /// 指定的地区不存在
    #[error("未找到地区: {name}")]
    RegionNotFound { name: String },
    /// 范围文件存在但无法读取或解析
    #[error("范围文件无效 ({}): {reason}", path.display())]
    ScopeFileInvalid { path: PathBuf, reason: String },
}

/// 进度存储错误（持久化失败）
///
/// 任何变体都会终止本次运行，磁盘上保留最后一次成功写入的快照。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 写入快照失败
    #[error("写入进度文件失败 ({}): {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 序列化快照失败
    #[error("序列化进度快照失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl ScopeError {
    /// 创建子项读取失败错误
    pub fn enumeration_unavailable(parent: impl Into<String>, reason: impl ToString) -> Self {
        ScopeError::EnumerationUnavailable {
            parent: parent.into(),
            reason: reason.to_string(),
        }
    }

    /// 是否只影响当前子树（其余兄弟节点可继续）
    pub fn is_subtree_local(&self) -> bool {
        matches!(self, ScopeError::EnumerationUnavailable { .. })
    }
}

impl StoreError {
    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Persist {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
