pub mod connection;
pub mod model;
pub mod query;
pub mod workspaces;
