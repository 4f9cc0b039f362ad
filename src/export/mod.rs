//! Exporting BigPlanet data as delimited text or JSON.

mod delimited;
mod json;
mod options;

pub use delimited::{archive_to_csv, csv_to_map, data_to_csv, write_output};
pub use json::{columns_to_json, JsonFormat};
pub use options::{OutputOptions, ULYSSES_FILE};
