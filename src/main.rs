use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use pdfshrink::cli::{format_file_size, Args};
use pdfshrink::config::Settings;
use pdfshrink::pdf::split::part_path;
use pdfshrink::pdf::{compress_document, split_by_size};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    // Validate input file
    if !args.input.exists() {
        anyhow::bail!("Input file '{}' does not exist.", args.input.display());
    }
    let is_pdf = args
        .input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        anyhow::bail!("Input file must be a PDF file.");
    }

    let output_path = args.output_path();

    // Confirm overwrite unless forced
    if output_path.exists() && !args.overwrite && !confirm_overwrite(&output_path)? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let original_size = fs::metadata(&args.input)
        .with_context(|| format!("Failed to read input file: {}", args.input.display()))?
        .len();

    let settings = Settings::from_args(&args);

    log::info!("input file: {}", args.input.display());
    log::info!("output file: {}", output_path.display());
    log::info!("original size: {}", format_file_size(original_size));
    log::info!("compression level: {:?}", args.compression);
    if settings.remove_images {
        log::info!("removing all images");
    }

    let outcome = compress_document(&args.input, &output_path, &settings)
        .with_context(|| "Failed to compress PDF")?;

    if outcome.images_seen > 0 {
        println!(
            "Processed {} images, changed {}",
            outcome.images_seen, outcome.images_changed
        );
    }

    if let Some(size_mb) = args.split_size {
        let chunks = split_by_size(&output_path, size_mb).with_context(|| "Failed to split PDF")?;

        if chunks > 1 {
            let chunks_size: u64 = (1..=chunks as u32)
                .filter_map(|n| fs::metadata(part_path(&output_path, n)).ok())
                .map(|m| m.len())
                .sum();

            println!("PDF processed and split successfully!");
            println!("Original size: {}", format_file_size(original_size));
            println!("Total size of chunks: {}", format_file_size(chunks_size));
            println!(
                "Size reduction: {:.1}%",
                reduction_percent(original_size, chunks_size)
            );
            println!("Created {} chunks", chunks);
            return Ok(());
        }

        println!(
            "File is already smaller than {}MB, no splitting needed.",
            size_mb
        );
    }

    let compressed_size = fs::metadata(&output_path)
        .with_context(|| format!("Failed to read output file: {}", output_path.display()))?
        .len();
    let reduction = reduction_percent(original_size, compressed_size);

    println!("PDF processed successfully!");
    println!("Original size: {}", format_file_size(original_size));
    println!("Processed size: {}", format_file_size(compressed_size));
    println!("Size reduction: {:.1}%", reduction);
    println!("Output saved to: {}", output_path.display());

    if reduction < 5.0 {
        println!("\nNote: Small reduction achieved. The PDF may already be optimized,");
        println!("or try a higher compression level with -c high");
    }

    Ok(())
}

fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

fn confirm_overwrite(path: &Path) -> io::Result<bool> {
    print!(
        "Output file '{}' already exists. Overwrite? (y/N): ",
        path.display()
    );
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_ascii_lowercase();

    Ok(response == "y" || response == "yes")
}
