use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = mockroute::cli::Cli::parse();
    if let Err(e) = mockroute::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
