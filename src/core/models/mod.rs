pub mod body;
pub mod nutrition;
pub mod permission;
pub mod snapshot;
