fn main() {
    if let Err(err) = csv_relational::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
