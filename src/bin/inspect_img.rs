// Print the channels of a saved image file.
//
// Usage: inspect_img <file> [<vendor> <model>]
// Vendor/model default to the file's metadata.

use anyhow::{bail, Context, Result};
use radioclone::{decode_image, find_model, load_image};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = match args.first() {
        Some(p) => p,
        None => bail!("usage: inspect_img <file> [<vendor> <model>]"),
    };

    let (mmap, metadata) = load_image(path).with_context(|| format!("loading {path}"))?;

    let (vendor, model_name) = match (args.get(1), args.get(2)) {
        (Some(v), Some(m)) => (v.clone(), m.clone()),
        _ => (metadata.vendor.clone(), metadata.model.clone()),
    };
    let model = find_model(&vendor, &model_name)
        .with_context(|| format!("unknown model '{vendor} {model_name}'"))?;

    println!(
        "{} ({} bytes, format '{}')",
        model.display,
        mmap.len(),
        model.protocol.mem_format.id
    );

    let channels = decode_image(&mmap, model.protocol.mem_format)?;
    let mut shown = 0;
    for ch in channels.occupied() {
        println!("{ch}");
        shown += 1;
    }
    println!("{shown} channels programmed");

    Ok(())
}
