use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 启动新的浏览器并导航到指定 URL
///
/// # 参数
/// - `headless`: 是否无头运行；需要人工完成验证时应保持可见
/// - `executable`: 浏览器可执行文件，`None` 时由 chromiumoxide 自动查找
pub async fn launch_browser(
    url: &str,
    headless: bool,
    executable: Option<&Path>,
) -> Result<(Browser, Page), BrowserError> {
    info!(
        "🚀 启动{}浏览器...",
        if headless { "无头" } else { "可见" }
    );
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder().args(vec![
        "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-dev-shm-usage", // 防止共享内存不足
    ]);
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|reason| {
        error!("配置浏览器失败: {}", reason);
        BrowserError::LaunchFailed { reason }
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed {
            reason: e.to_string(),
        }
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser
        .new_page(url)
        .await
        .map_err(|source| BrowserError::PageCreationFailed { source })?;

    info!("✅ 浏览器已导航到: {}", url);
    Ok((browser, page))
}
