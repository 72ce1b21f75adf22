fn main() {
    if let Err(err) = panelscan::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
