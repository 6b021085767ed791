//! Host-facing capabilities: the page DOM and the OS clipboard

pub mod clipboard;
pub mod page;
