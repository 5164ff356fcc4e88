//! `docchat extract` — Print the text the chat would see for a PDF.

use std::path::Path;

use docchat_document::{DocumentExtractor, word_count};

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let extractor = DocumentExtractor::new(config.document.max_bytes);

    let text = extractor.extract_file(path)?;
    println!("{text}");
    eprintln!("\n  {} words", word_count(&text));

    Ok(())
}
