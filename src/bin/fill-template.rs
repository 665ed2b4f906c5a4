//! Copy a text file, substituting placeholder tokens with facts about a binary payload.
//!
//! Used to embed a built binary artifact (e.g. a wasm module) into a text template:
//!
//! | Token                 | Replacement                                    |
//! |-----------------------|------------------------------------------------|
//! | `REPLACE_WITH_BASE64` | the payload, base64-encoded                    |
//! | `REPLACE_WITH_DATE`   | the local date and time of the run             |
//! | `REPLACE_WITH_SIZE`   | payload byte counts, raw and base64-encoded    |
//! | `REPLACE_WITH_SHA256` | lowercase hex SHA-256 of the payload           |

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use base64::prelude::*;
use clap::Parser;
use sha2::{Digest, Sha256};

#[derive(Debug, Parser)]
#[command(name = "fill-template")]
#[command(about = "Render a text template with details of a binary payload")]
#[command(version)]
struct Args {
    /// File to write the rendered template to.
    dest_file: PathBuf,

    /// Template file containing `REPLACE_WITH_*` tokens.
    src_file: PathBuf,

    /// Binary payload described by the substituted tokens.
    payload_file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> io::Result<()> {
    let payload = std::fs::read(&args.payload_file)?;
    let template = std::fs::read_to_string(&args.src_file)?;
    let date = chrono::Local::now().format("%c").to_string();
    std::fs::write(&args.dest_file, render(&template, &payload, &date))
}

fn render(template: &str, payload: &[u8], date: &str) -> String {
    let encoded = BASE64_STANDARD.encode(payload);
    let sha256 = hex::encode(Sha256::digest(payload));
    let size = format!("{} bytes ({} in base64)", payload.len(), encoded.len());
    template
        .replace("REPLACE_WITH_BASE64", &encoded)
        .replace("REPLACE_WITH_DATE", date)
        .replace("REPLACE_WITH_SIZE", &size)
        .replace("REPLACE_WITH_SHA256", &sha256)
}
