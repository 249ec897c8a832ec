pub mod state;
pub mod theme;
pub mod views;

pub use state::{AppState, StatusMessage, StatusType, View};
