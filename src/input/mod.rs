//! Reading BigPlanet input files and discovering simulation sweeps.

mod bpl;
mod help;
mod lines;
mod sims;

pub use bpl::BplInput;
pub use help::{OptionHelp, VplanetHelp};
pub use lines::{find_option, option_lines, OptionLine};
pub use sims::{get_log_name, get_sims, get_snames};
