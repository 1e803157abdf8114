use pulsehammer::entry;

fn main() {
    if let Err(err) = entry::run() {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
