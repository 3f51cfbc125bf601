#[tokio::main]
async fn main() {
    if let Err(e) = pagehint_lib::run().await {
        eprintln!("pagehint: {e}");
        std::process::exit(1);
    }
}
