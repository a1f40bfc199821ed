fn main() {
    if let Err(err) = datavista::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
