pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod io;
pub mod system;
pub mod tracking;
pub mod viz;
