use std::path::Path;

use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Browser;
use tracing::info;

use crate::error::BrowserError;

/// 允许下载并把文件统一写入 `dir`
///
/// `dir` 必须是绝对路径，浏览器会忽略相对路径。
pub async fn enable_downloads(browser: &Browser, dir: &Path) -> Result<(), BrowserError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| BrowserError::ConfigurationFailed {
            reason: format!("无法创建下载目录 {}: {}", dir.display(), e),
        })?;

    let params = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(dir.to_string_lossy().to_string())
        .build()
        .map_err(|reason| BrowserError::ConfigurationFailed { reason })?;

    browser.execute(params).await?;
    info!("📂 浏览器下载目录: {}", dir.display());
    Ok(())
}
