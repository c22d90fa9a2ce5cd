//! Inspects and converts persisted asset references.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{AppSettings, Args, Parser, Subcommand};
use lgn_asset_ref::{
    serializer::{binary, text, AssetReference, Endianness, CURRENT_VERSION},
    AssetCatalog, AssetManagerConfig, MemoryCatalog,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "Asset Reference")]
#[clap(about = "Asset reference conversion CLI", version, author)]
#[clap(setting(AppSettings::ArgRequiredElseHelp))]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Format {
    /// Version the data was written with.
    #[clap(long = "format-version", default_value_t = CURRENT_VERSION)]
    version: u32,
    /// Binary data is big endian.
    #[clap(long)]
    big_endian: bool,
}

impl Format {
    fn endianness(&self) -> Endianness {
        if self.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the text form of a binary reference
    #[clap(name = "to-text")]
    ToText {
        /// File holding the binary reference.
        file: PathBuf,
        #[clap(flatten)]
        format: Format,
    },
    /// Write the binary form of a text reference
    #[clap(name = "to-binary")]
    ToBinary {
        /// Text reference.
        text: String,
        /// Output file.
        #[clap(long)]
        output: PathBuf,
        #[clap(flatten)]
        format: Format,
    },
    /// Print every field of a binary reference
    #[clap(name = "inspect")]
    Inspect {
        /// File holding the binary reference.
        file: PathBuf,
        #[clap(flatten)]
        format: Format,
    },
    /// Replace a legacy id by its canonical id
    #[clap(name = "remap")]
    Remap {
        /// Text reference.
        text: String,
        /// Asset catalog file.
        #[clap(long)]
        catalog: PathBuf,
        /// Version the text was written with.
        #[clap(long = "format-version", default_value_t = CURRENT_VERSION)]
        version: u32,
    },
    /// Print the effective asset manager configuration
    #[clap(name = "config")]
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::ToText { file, format } => {
            println!("{}", binary_to_text(&file, &format)?);
        }
        Commands::ToBinary {
            text,
            output,
            format,
        } => {
            let size = text_to_binary(&text, &output, &format)?;
            info!("Wrote {} bytes to {}", size, output.display());
        }
        Commands::Inspect { file, format } => {
            let data = fs::read(&file)
                .with_context(|| format!("failed reading {}", file.display()))?;
            let decoded = binary::decode(&data, format.version, format.endianness())?;
            println!("id:            {}", decoded.id);
            println!("type:          {}", decoded.asset_type);
            match &decoded.hint {
                Some(hint) if decoded.hint_truncated => {
                    println!("hint:          {} (truncated)", hint);
                }
                Some(hint) => println!("hint:          {}", hint),
                None => println!("hint:          <not persisted>"),
            }
            match decoded.load_behavior {
                Some(load_behavior) => println!("load behavior: {}", load_behavior),
                None => println!("load behavior: <not persisted>"),
            }
        }
        Commands::Remap {
            text,
            catalog,
            version,
        } => {
            let catalog = MemoryCatalog::load(&catalog)
                .with_context(|| format!("failed reading catalog {}", catalog.display()))?;
            println!("{}", remap(&text, version, &catalog)?);
        }
        Commands::Config => {
            let config = AssetManagerConfig::load()?;
            println!("{:#?}", config);
        }
    }
    Ok(())
}

fn binary_to_text(file: &Path, format: &Format) -> anyhow::Result<String> {
    let data = fs::read(file).with_context(|| format!("failed reading {}", file.display()))?;
    let decoded = binary::decode(&data, format.version, format.endianness())?;
    if decoded.hint_truncated {
        warn!("Hint of {} was truncated", decoded.id);
    }
    Ok(text::to_text(&decoded.to_reference(), CURRENT_VERSION))
}

fn text_to_binary(text: &str, output: &Path, format: &Format) -> anyhow::Result<usize> {
    let decoded = text::parse(text, format.version)?;
    let data = binary::encode(&decoded.to_reference(), format.endianness());
    fs::write(output, &data).with_context(|| format!("failed writing {}", output.display()))?;
    Ok(data.len())
}

fn remap(text: &str, version: u32, catalog: &dyn AssetCatalog) -> anyhow::Result<String> {
    let decoded = text::parse(text, version)?;
    let mut reference: AssetReference = decoded.to_reference();

    let info = match catalog.asset_info_by_id(reference.id) {
        Some(info) if info.id.is_valid() => info,
        _ => bail!("asset {} is not in the catalog", reference.id),
    };
    if info.id != reference.id {
        info!("Remapping legacy asset id {} to {}", reference.id, info.id);
        reference.id = info.id;
        if !info.relative_path.is_empty() {
            reference.hint = info.relative_path;
        }
    }
    Ok(text::to_text(&reference, CURRENT_VERSION))
}
