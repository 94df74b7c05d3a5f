//! Command-line front end for the mapping engine.
//!
//! Loads a mapping (plus optional script), then translates wire messages
//! given as hex bytes into actions printed as JSON lines:
//!
//! ```text
//! $ deckbridge --mapping demo-deck.midi.xml --script demo-deck-scripts.js
//! 90 0B 7F
//! {"type":"press","control":{"type":"play"},"down":true,"deck":1}
//! ```

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deckbridge_core::MidiMessage;
use deckbridge_mapping::Dispatcher;

/// Controller mapping translator.
#[derive(Parser, Debug)]
#[command(name = "deckbridge")]
#[command(about = "Translate control-surface MIDI messages into host actions")]
struct Args {
    /// Path to the mapping XML
    #[arg(long)]
    mapping: PathBuf,

    /// Path to the mapping's script file
    #[arg(long)]
    script: Option<PathBuf>,

    /// Translate a single message given as hex bytes (e.g. "90 0B 7F")
    /// instead of reading messages from stdin
    #[arg(long)]
    message: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let xml_src = fs::read_to_string(&args.mapping)
        .with_context(|| format!("reading mapping {}", args.mapping.display()))?;
    let script_src = args
        .script
        .as_ref()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
        })
        .transpose()?;

    let mut dispatcher = Dispatcher::from_sources(&xml_src, script_src.as_deref())?;

    let doc = dispatcher.document();
    log::info!(
        "loaded mapping {:?} ({} controls, {} outputs)",
        doc.info.name.as_deref().unwrap_or("unnamed"),
        doc.controls.len(),
        doc.outputs.len()
    );

    if let Some(message) = &args.message {
        return translate_line(&mut dispatcher, message);
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        translate_line(&mut dispatcher, &line)?;
    }
    Ok(())
}

fn translate_line(dispatcher: &mut Dispatcher, line: &str) -> Result<()> {
    let bytes = parse_hex_bytes(line)?;
    let msg = MidiMessage::from_bytes(&bytes)?;
    log::debug!("{:?} on channel {}", msg.kind(), msg.channel());

    for action in dispatcher.handle_incoming(msg)? {
        println!("{}", serde_json::to_string(&action)?);
    }
    Ok(())
}

fn parse_hex_bytes(line: &str) -> Result<Vec<u8>> {
    line.split_whitespace()
        .map(|token| {
            let digits = token.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(digits, 16).with_context(|| format!("invalid hex byte {token:?}"))
        })
        .collect()
}
