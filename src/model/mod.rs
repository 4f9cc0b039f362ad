//! Data model shared by the processing, storage and extraction layers.
//!
//! Simulation outputs are gathered into [`SimData`], a map from dataset key
//! (`body:variable[:aggregation]`) to a [`Dataset`] of units plus values.

mod data;
mod key;
mod value;

pub use data::{KeyFilter, SimData};
pub use key::{Aggregation, Key};
pub use value::{format_number, parse_number, Dataset, Value};
