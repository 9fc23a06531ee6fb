// vmtrans - Hack VM to Hack assembly translator
//
// Usage:
//   vmtrans Foo.vm                 writes Foo.asm
//   vmtrans ProgDir --bootstrap    writes ProgDir/ProgDir.asm, starting at Sys.init

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use vmtrans::module::{self, Options};
use vmtrans::LabelScope;

#[derive(Parser, Debug)]
#[command(name = "vmtrans")]
#[command(about = "Hack VM to Hack assembly translator")]
#[command(version)]
struct Args {
    /// A .vm file, or a directory of them
    input: PathBuf,

    /// Output file (default: Foo.asm next to Foo.vm, or Dir/Dir.asm)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit SP=256 and a call to ENTRY before the translated code
    #[arg(long, value_name = "ENTRY", num_args = 0..=1, default_missing_value = "Sys.init")]
    bootstrap: Option<String>,

    /// Prefix user labels with their enclosing function
    #[arg(long)]
    scope_labels: bool,

    /// Leave out the `// <vm command>` provenance comments
    #[arg(long)]
    no_comments: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            bootstrap: self.bootstrap.clone(),
            label_scope: if self.scope_labels {
                LabelScope::Function
            } else {
                LabelScope::File
            },
            comments: !self.no_comments,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !args.input.exists() {
        anyhow::bail!("Input does not exist: {}", args.input.display());
    }

    let lines = module::translate_path(&args.input, &args.options())
        .with_context(|| format!("Failed to translate {}", args.input.display()))?;

    let outfilename = args
        .output
        .clone()
        .unwrap_or_else(|| module::output_path(&args.input));
    let outfile = File::create(&outfilename)
        .with_context(|| format!("Failed to create {}", outfilename.display()))?;
    let mut outfile = BufWriter::new(outfile);

    for instruction in &lines {
        writeln!(outfile, "{}", instruction).context("Failed to write output")?;
    }
    outfile.flush().context("Failed to write output")?;

    info!(output = %outfilename.display(), lines = lines.len(), "wrote assembly");
    Ok(())
}
