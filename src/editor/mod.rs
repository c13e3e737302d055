//! The editor workflow format: nodes with positions, widget values and a global link table.
mod types;

pub use types::*;
