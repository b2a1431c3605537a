pub mod add;
pub mod delete;
pub mod init;
pub mod open;
pub mod project;
pub mod query;
pub mod search;
pub mod update;
