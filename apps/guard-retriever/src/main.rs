use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = guard_retriever::Args::parse();
	guard_retriever::run(args).await
}
