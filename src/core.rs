pub mod clipboard;
pub mod context;
pub mod gap;
pub mod insertion;
pub mod service;
