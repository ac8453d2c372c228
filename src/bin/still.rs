// Apply a region transform to a single still image

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use region_fx::{config::Config, region::CornerPair, transform::TransformMode, video::Frame};

#[derive(Parser)]
#[command(name = "region-fx-still", about = "Crop or pixelate a rectangle of a still image")]
struct Cli {
    /// Input image (PNG or JPEG)
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Rectangle corners: X0,Y0,X1,Y1
    #[arg(long)]
    rect: CornerPair,

    /// Transform to apply (crop, mosaic)
    #[arg(short, long, value_enum, default_value_t = TransformMode::Mosaic)]
    mode: TransformMode,

    /// Mosaic block count per axis
    #[arg(short, long)]
    block_size: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::default();
    if let Some(block_size) = cli.block_size {
        config.mosaic.block_size = block_size;
    }

    let image = image::open(&cli.input)
        .with_context(|| format!("could not read {}", cli.input.display()))?
        .to_rgb8();
    let frame = Frame::new(image);
    let region = cli.rect.normalize(frame.width(), frame.height());

    let transform = cli.mode.build(&config);
    println!("{} ({})", transform.name(), transform.description());
    println!("Region {} on a {}x{} image", region, frame.width(), frame.height());

    let out = transform.apply(frame, &region)?;
    out.save(&cli.output)
        .with_context(|| format!("could not write {}", cli.output.display()))?;
    println!("Saved {}x{} image to {}", out.width(), out.height(), cli.output.display());

    Ok(())
}
