fn main() {
    if let Err(err) = layout_snap::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
