use clap::Parser;

use atlas_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	atlas_eval::run(args).await
}
