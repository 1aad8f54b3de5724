pub mod attempt;
pub mod loaders;
pub mod progress;
pub mod scope;

pub use attempt::{AttemptResult, RunDecision};
pub use loaders::{load_scope_file, save_scope_file};
pub use progress::{ProgressRecord, ProgressSnapshot, ProgressStatus, StoreSummary};
pub use scope::{NodeId, NodeKind, RawRegion, RawSubRegion, ScopeEntry, ScopeModel, ScopeNode, WorkItem};
