use args::Args;
use clap::Parser;
use server::ServeConfig;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args)?;

    let config = args.config()?;
    let listen_address = args.listen_address(&config);

    if let Err(e) = server::serve(ServeConfig { listen_address, config }).await {
        log::error!("Server failed to start: {e}");
        std::process::exit(1);
    }

    Ok(())
}
