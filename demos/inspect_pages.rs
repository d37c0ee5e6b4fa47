use anyhow::{Context, Result};
use pdf_crunch::Cruncher;
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: inspect_pages <pdf_file>");
        return Ok(());
    }

    let doc = Cruncher::open(&args[1]).with_context(|| format!("Failed to open {}", args[1]))?;
    let metadata = doc.metadata()?;

    println!("Total pages: {}", metadata.page_count);
    println!("PDF version: {}", metadata.version);
    if let Some(title) = &metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &metadata.author {
        println!("Author: {}", author);
    }
    println!("MD5: {}", doc.md5()?);

    for info in doc.page_info()? {
        println!("\n=== Page {} ===", info.number);

        let media = info.media_box;
        println!(
            "MediaBox: [{} {} {} {}] ({} x {})",
            media.x0, media.y0, media.x1, media.y1,
            media.width(), media.height()
        );

        let crop = info.crop_box;
        if crop != media {
            println!("CropBox: [{} {} {} {}]", crop.x0, crop.y0, crop.x1, crop.y1);
        }

        if info.rotation != 0 {
            println!("Rotate: {}", info.rotation);
        }

        let m = info.transform;
        if m != pdf_crunch::Matrix::IDENTITY {
            println!("Initial transform: [{} {} {} {} {} {}]", m.a, m.b, m.c, m.d, m.e, m.f);
        }
    }

    Ok(())
}
