//! Transcript command handler.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mavis_core::markdown::{RenderOptions, Renderer};
use mavis_core::transcript::{self, HISTORY_LOAD_FAILED};

pub fn run(file: &Path, options: RenderOptions, welcome: bool, fallback: bool) -> Result<()> {
    let messages = fs::read_to_string(file)
        .with_context(|| format!("read history from {}", file.display()))
        .and_then(|json| transcript::parse_history(&json));

    let messages = match messages {
        Ok(messages) => messages,
        Err(err) if fallback => {
            tracing::error!("Failed to load history: {err:#}");
            println!("{HISTORY_LOAD_FAILED}");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let renderer = Renderer::new(options);
    print!(
        "{}",
        transcript::render_transcript(&renderer, &messages, welcome)
    );
    Ok(())
}
