pub mod block;
pub mod types;
