//! Take the last five pages of a PDF, crop them to their top-left region,
//! turn them sideways and append them, at half size, to the first page.
//!
//! Run with `RUST_LOG=pdf_crunch=debug` to see every intermediate file.

use anyhow::{bail, Context, Result};
use pdf_crunch::{verify_file, Bounds, Cruncher};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("Usage: crunch <input.pdf> <output.pdf>");
    }
    let (input, output) = (&args[1], &args[2]);

    let digest = Cruncher::scoped(input, |doc| {
        let tail = doc
            .slice(-5..)?
            .crop_to(Bounds::new().xmax(500.0).ymin(800.0))?
            .rotate90cw(1)?
            .scale_by(0.5)?;

        let result = doc.page(0)?.join(&[&tail])?;
        result.write(output)?;
        result.md5()
    })
    .with_context(|| format!("Failed to crunch {}", input))?;

    if !verify_file(Path::new(output), &digest)? {
        bail!("{} does not match the intermediate result", output);
    }

    println!("Wrote {} (md5 {})", output, digest);
    Ok(())
}
