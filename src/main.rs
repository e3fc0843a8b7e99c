//! SSTV image decoder

mod config;
mod context;
mod decode;
mod dsp;
mod err;
mod filters;
mod frequency;
mod misc;
mod modes;
mod raster;
mod sstv;
mod sync;
mod wav;

use log::{debug, error};


/// Defined by Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application entry point
fn main() -> err::Result<()> {

    let (verbosity, mode) = config::get_config();

    simple_logger::init_with_level(verbosity)?;

    debug!("Mode: {:?}", mode);

    match mode {
        config::Mode::Version => {

            println!("sstv-decode version {}", VERSION);
            std::process::exit(0);

        },
        config::Mode::Decode(settings) => {

            match sstv::decode(&settings) {
                Ok(()) => (),
                Err(e) => error!("{}", e),
            };

        },
    };

    Ok(())
}
