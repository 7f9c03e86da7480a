fn main() {
    if let Err(e) = signscope::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
