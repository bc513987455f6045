pub mod automatic;
pub mod setup;
pub mod download;
pub mod list;
pub mod prompt;
