pub mod toml_loader;

pub use toml_loader::{load_scope_file, save_scope_file};
