// Download a radio's memory image over a serial port.
//
// Usage: clone_read <port> <vendor> <model> <out-file>

use anyhow::{bail, Context, Result};
use radioclone::formats::save_radio_image;
use radioclone::{find_model, progress_channel, CloneSession, LinkSettings, SerialLink};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [port_name, vendor, model_name, out] = args.as_slice() else {
        bail!("usage: clone_read <port> <vendor> <model> <out-file>");
    };

    let model = find_model(vendor, model_name)
        .with_context(|| format!("unknown model '{vendor} {model_name}'"))?;
    let proto = model.effective_protocol();

    let mut link = SerialLink::open(port_name, LinkSettings::new(proto.baud))
        .with_context(|| format!("opening {port_name}"))?;

    let (tx, mut rx) = progress_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprint!(
                "\r{}: {}/{} bytes ({:.0}%)",
                event.message,
                event.bytes_done,
                event.bytes_total,
                event.percent()
            );
        }
        eprintln!();
    });

    let image = CloneSession::new(&mut link, model)
        .with_progress(tx)
        .download()
        .await
        .with_context(|| format!("cloning from {}", model.display))?;
    let _ = printer.await;

    save_radio_image(out, &image).with_context(|| format!("writing {out}"))?;
    println!("saved {} bytes to {out}", image.mmap.len());

    Ok(())
}
