pub mod config;
pub mod logging;

pub mod api;
pub mod downloader;
pub mod illust_id;
pub mod mount;
pub mod naming;
pub mod notify;
pub mod orchestrator;
pub mod settings;
