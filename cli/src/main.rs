//! Binary entrypoint for fontlib (made by fontlib)

fn main() {
    env_logger::init();

    if let Err(err) = fontlib_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
