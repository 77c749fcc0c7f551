#![allow(clippy::multiple_crate_versions)]

//! Backdrop - X11 multi-monitor desktop background setter.
//!
//! Draws one image per monitor into a single root window background, then
//! either exits or stays resident to redraw when the screen layout changes.

fn main() {
    if let Err(err) = backdrop_lib::cli::run() {
        eprintln!("backdrop: {err}");
        std::process::exit(1);
    }
}
