//! Display width helpers for rendered text.

mod utils;

pub use utils::{display_width, skip_columns, truncate_to_width};
