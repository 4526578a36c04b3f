use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = kbs_api::Args::parse();

	kbs_api::run(args).await
}
