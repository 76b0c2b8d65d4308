pub mod backup;
pub mod download;
pub mod error;
pub mod volume;
