pub mod config;
pub mod milestone;
pub mod project;
pub mod report;
pub mod update;
pub mod user;

pub use config::*;
pub use milestone::*;
pub use project::*;
pub use report::*;
pub use update::*;
pub use user::*;
