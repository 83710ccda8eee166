pub mod body_cmd;
pub mod config_cmd;
pub mod output;
pub mod renderer;
pub mod today_cmd;
pub mod watch_cmd;
