fn main() {
    if let Err(err) = teampulse_lib::run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
