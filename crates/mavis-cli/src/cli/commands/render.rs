//! Render command handler.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use mavis_core::markdown::{RenderOptions, Renderer};

pub fn run(file: Option<&Path>, options: RenderOptions) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read markdown from {}", path.display()))?,
        None => io::read_to_string(io::stdin()).context("read markdown from stdin")?,
    };

    let html = Renderer::new(options).render(&text);

    let mut stdout = io::stdout().lock();
    stdout.write_all(html.as_bytes()).context("write html")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}
