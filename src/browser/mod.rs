//! 浏览器会话：连接或启动浏览器，配置下载目录

pub mod connection;
pub mod downloads;
pub mod launcher;

pub use connection::connect_to_browser_and_page;
pub use downloads::enable_downloads;
pub use launcher::launch_browser;
