//! 基础设施层：持有稀缺资源（浏览器页面、进度文件），只暴露能力

pub mod js_executor;
pub mod progress_store;

pub use js_executor::JsExecutor;
pub use progress_store::ProgressStore;
