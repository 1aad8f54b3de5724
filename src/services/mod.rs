//! 业务能力层
//!
//! 每个服务只负责一种能力：枚举范围、操作表单、下载分卷、询问决策、节流等待。

pub mod action_executor;
pub mod decision;
pub mod form_scope_reader;
pub mod form_session;
pub mod pacing;
pub mod part_downloader;
pub mod scope_provider;

pub use action_executor::ActionExecutor;
pub use decision::{ConsolePrompt, DecisionChannel, FixedPolicy};
pub use form_scope_reader::FormScopeReader;
pub use form_session::FormSession;
pub use pacing::{PaceOutcome, Pacer};
pub use part_downloader::PartDownloader;
pub use scope_provider::{discover, RegionSelection, ScopeProvider, TomlScopeProvider};
