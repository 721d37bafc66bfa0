fn main() {
    if let Err(err) = edge_router::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
