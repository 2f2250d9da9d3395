pub mod counties;
pub mod fetch;
pub mod first_passage;
pub mod greenness;
pub mod trace;
pub mod weights;

use std::path::PathBuf;

use chrono::{Datelike, Local};

pub use counties::counties;
pub use fetch::fetch;
pub use first_passage::first_passage;
pub use greenness::greenness;
pub use trace::trace;
pub use weights::weights;

/// Default output path: `wheatrust-<name>-YYYY-MM-DD.<ext>` in the home
/// directory, falling back to the working directory when there is none.
pub fn make_output_file_name(name: &str, extension: &str) -> PathBuf {
    let today = Local::now();
    let file_name = format!(
        "wheatrust-{}-{}-{:02}-{:02}.{}",
        name,
        today.year(),
        today.month(),
        today.day(),
        extension,
    );

    dirs::home_dir().unwrap_or_default().join(file_name)
}
