pub mod client;

pub use client::{MirrorClient, MirrorDownload, Result};
