pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod llm;
pub mod util;
pub mod web;
