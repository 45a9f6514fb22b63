use gumdrop::Options;

use httpagg::prelude::*;

fn main() {
    let configuration = HttpAggConfiguration::parse_args_default_or_exit();

    // If version flag is set, display package name and version and exit.
    if configuration.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    if let Err(e) = configuration.initialize_logger() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match generate_report(&configuration) {
        Ok(Some(groups)) => log::info!("reported on {} groups", groups),
        Ok(None) => log::warn!("nothing recorded, no report written"),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
