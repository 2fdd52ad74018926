pub mod logging;
pub mod print;

use indicatif::{ProgressBar, ProgressStyle};

pub fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} {bar:30.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style);
    }
    bar
}
