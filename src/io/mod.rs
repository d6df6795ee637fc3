//! Input streams for the command-line runner.

pub mod frames;

pub use frames::FrameStream;
