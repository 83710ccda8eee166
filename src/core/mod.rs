pub mod aggregate;
pub mod config;
pub mod formatter;
pub mod models;
pub mod notify;
pub mod permission;
pub mod poller;
pub mod process;
pub mod providers;
pub mod store;
pub mod weekly;
pub mod window;
