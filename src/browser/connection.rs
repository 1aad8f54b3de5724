use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 连接到已打开调试端口的浏览器并获取页面
///
/// 优先复用 URL 以 `target_url` 开头的已有标签页，找不到时新建页面并导航。
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: &str,
) -> Result<(Browser, Page), BrowserError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|source| {
        error!("连接浏览器失败: {}", source);
        BrowserError::ConnectionFailed { port, source }
    })?;
    debug!("浏览器连接成功");

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

    let pages = browser
        .pages()
        .await
        .map_err(|source| BrowserError::PageCreationFailed { source })?;
    debug!("获取到 {} 个页面", pages.len());

    for p in pages.iter() {
        if let Ok(Some(url)) = p.url().await {
            debug!("检查页面: {}", url);
            if url.starts_with(target_url) {
                info!("✓ 复用已打开的页面: {}", url);
                return Ok((browser, p.clone()));
            }
        }
    }

    debug!("未找到匹配的页面，创建新页面并导航到: {}", target_url);
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|source| BrowserError::PageCreationFailed { source })?;
    page.goto(target_url)
        .await
        .map_err(|source| BrowserError::NavigationFailed {
            url: target_url.to_string(),
            source,
        })?;
    info!("已导航到: {}", target_url);

    Ok((browser, page))
}
