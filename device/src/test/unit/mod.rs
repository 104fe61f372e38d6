pub mod buffer;
pub mod handoff;
