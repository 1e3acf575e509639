pub mod cli;

use std::fs::File;
use std::io;

use anyhow::Context;
use clap::Parser;

use cli::*;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json {
        common::logger::init_logger_json("vwap-cli");
    } else {
        common::logger::init_logger("vwap-cli");
    }

    let records = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_records(file)?
        }
        None => read_records(io::stdin().lock())?,
    };

    let out = run(&cli, &records)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render_text(&out));
    }

    Ok(())
}
