pub mod empty_server;

pub use empty_server::{EmptyServerMonitor, PendingTimer};
