use async_trait::async_trait;

use crate::models::{AttemptResult, WorkItem};

/// 执行一次下载尝试
///
/// 调用可能很慢，也可能无限期等待人工操作（例如在浏览器中完成验证）；
/// 编排器不会为它设置超时，超时策略由实现自行决定。
#[async_trait]
pub trait ActionExecutor: Send {
    async fn attempt(&mut self, item: &WorkItem) -> AttemptResult;
}
