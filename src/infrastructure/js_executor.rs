//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"与"等待条件成立"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};

use crate::error::BrowserError;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源（`Page` 内部为 Arc，clone 代价很低）
/// - 暴露 eval() / wait_until() 能力
/// - 不认识地区 / 分卷
/// - 不处理下载流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// 脚本返回 `null` / `undefined` 时得到 `JsonValue::Null`
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, BrowserError> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, BrowserError> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 反复执行返回布尔值的 JS 表达式，直到为 true 或超时
    ///
    /// # 返回
    /// 超时返回 `Ok(false)`
    pub async fn wait_until(
        &self,
        js_predicate: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval_as::<bool>(js_predicate).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(poll_interval).await;
        }
    }
}
