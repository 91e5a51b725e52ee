//! # Voxel World Application Entry Point
//!
//! The headless driver of the simulation core. It calls into the library's
//! `run()` function, optionally with the path of a JSON world configuration.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match voxel_world_core::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
