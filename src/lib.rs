//! Open Clipart gallery adapter: browse the recent feed, search by keyword
//! and hand results to a host platform as file-listing records.

pub mod commons;
pub mod config;
pub mod db;
pub mod feed;
pub mod form;
pub mod http;
pub mod model;
pub mod repository;
pub mod settings;
pub mod strings;
