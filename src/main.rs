use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use snipkit::{config, edit_file, logging, storage, EditOp};

/// Headless front end for the snipkit editing core.
#[derive(Parser, Debug)]
#[command(
    name = "snipkit",
    version,
    about = "Apply filters, rotation, crop, snip-and-swap, text and bubbles to an image",
    long_about = "Runs each --op in order through the editor, then writes the flattened PNG.\n\n\
                  Operations:\n  \
                  grayscale | sepia | invert | rotate-left | rotate-right | undo | revert\n  \
                  crop:X,Y,W,H\n  \
                  swap:X,Y,W,H:X,Y,W,H\n  \
                  text:X,Y:CONTENT\n  \
                  bubble:X,Y:speech|thought:CONTENT\n  \
                  draw:X,Y;X,Y;..."
)]
struct Cli {
    /// Image to edit (PNG, JPEG, GIF, BMP, or WEBP).
    input: PathBuf,

    /// Output PNG. Defaults to edited-<stem>.png beside the input.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Operation to apply. Repeat for more; they run in order.
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<EditOp>,

    /// Editor settings JSON, instead of $XDG_CONFIG_HOME/snipkit/config.json.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn default_output(input: &Path) -> PathBuf {
    let source_name = input.file_name().and_then(|name| name.to_str());
    input.with_file_name(storage::export_file_name(source_name))
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => config::load_editor_config_from(path),
        None => config::load_editor_config(),
    };
    let output = cli.output.clone().unwrap_or_else(|| default_output(&cli.input));

    let written = edit_file(&cli.input, &output, &cli.ops, &config)
        .with_context(|| format!("failed to edit {}", cli.input.display()))?;
    println!("{}", written.display());
    Ok(())
}
