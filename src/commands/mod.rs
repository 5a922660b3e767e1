pub mod config;
pub mod find_archives;
pub mod import;
pub mod library;
pub mod project;
