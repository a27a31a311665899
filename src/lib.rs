pub mod config;
pub mod directory;
pub mod export;
pub mod incidents;
pub mod shared;
