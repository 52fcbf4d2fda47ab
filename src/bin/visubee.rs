//! VisuBee CLI Tool
//!
//! Command-line interface for extracting edge maps and removing uniform
//! backgrounds from images.

#[cfg(feature = "cli")]
use visubee::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
