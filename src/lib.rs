pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod smoothing;
pub mod system;
pub mod tracking;
pub mod world;
