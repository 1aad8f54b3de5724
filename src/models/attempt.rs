use std::fmt;
use std::path::PathBuf;

/// 一次下载尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// 下载成功，附带文件最终位置
    Success { artifact: PathBuf },
    /// 下载失败
    Failure { reason: String, retryable: bool },
}

impl AttemptResult {
    pub fn success(artifact: impl Into<PathBuf>) -> Self {
        AttemptResult::Success {
            artifact: artifact.into(),
        }
    }

    pub fn failure(reason: impl Into<String>, retryable: bool) -> Self {
        AttemptResult::Failure {
            reason: reason.into(),
            retryable,
        }
    }
}

/// 失败后的人工决策，只对当前这一次失败有效
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDecision {
    Retry,
    Skip,
    Abort,
}

impl RunDecision {
    /// 解析操作员输入
    ///
    /// 直接回车等同于跳过；`stop` 与 `abort` 等价。
    pub fn from_operator_input(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "s" | "skip" => Some(RunDecision::Skip),
            "r" | "retry" => Some(RunDecision::Retry),
            "a" | "abort" | "stop" | "q" => Some(RunDecision::Abort),
            _ => None,
        }
    }
}

impl fmt::Display for RunDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunDecision::Retry => "重试",
            RunDecision::Skip => "跳过",
            RunDecision::Abort => "中止",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_input_is_case_insensitive() {
        assert_eq!(RunDecision::from_operator_input(" Retry\n"), Some(RunDecision::Retry));
        assert_eq!(RunDecision::from_operator_input("STOP"), Some(RunDecision::Abort));
        assert_eq!(RunDecision::from_operator_input("\n"), Some(RunDecision::Skip));
        assert_eq!(RunDecision::from_operator_input("maybe"), None);
    }
}
