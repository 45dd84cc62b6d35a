use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use log::debug;
use optoflood_common::mobility::{has_mobility_flag, FloodParams, MobilityMeta};
use optoflood_common::ndn::Name;

/// OptoFlood wire-field inspector
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode or decode the mobility metadata block of a Data packet
    Meta {
        #[clap(subcommand)]
        cmd: MetaCommands,
    },

    /// Encode or decode the flood parameters of an Interest
    Params {
        #[clap(subcommand)]
        cmd: ParamsCommands,
    },

    /// Inspect an NDN name (NDN URI format)
    Name {
        /// Name to inspect, e.g. /video/seg1
        name: String,
    },
}

#[derive(Subcommand)]
enum MetaCommands {
    /// Build a metadata block and print it as hex
    Encode {
        /// Mark the Data as mobility-flagged
        #[clap(long)]
        mobility: bool,

        /// Flood identifier for this mobility event
        #[clap(long)]
        flood_id: Option<u64>,

        /// Producer mobility sequence number
        #[clap(long)]
        seq: Option<u32>,

        /// Trace hint as hex bytes
        #[clap(long)]
        hint: Option<String>,
    },

    /// Decode a hex metadata block and print its fields
    Decode {
        /// Metadata block as hex bytes
        hex: String,
    },
}

#[derive(Subcommand)]
enum ParamsCommands {
    /// Build flood parameters and print them as hex
    Encode {
        /// Hop budget for the flood
        #[clap(long, default_value = "3")]
        hop_limit: u8,

        /// Trace hint as hex bytes
        #[clap(long)]
        hint: Option<String>,
    },

    /// Decode hex flood parameters and print their fields
    Decode {
        /// Flood parameters as hex bytes
        hex: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Meta { cmd } => match cmd {
            MetaCommands::Encode {
                mobility,
                flood_id,
                seq,
                hint,
            } => {
                let meta = MobilityMeta {
                    mobility_flag: mobility,
                    flood_id,
                    new_face_seq: seq,
                    trace_hint: parse_hint(hint.as_deref())?,
                    unknown: Vec::new(),
                };
                let wire = meta.encode().context("Failed to encode metadata")?;
                debug!("{} bytes", wire.len());
                println!("{}", hex::encode(&wire));
            }
            MetaCommands::Decode { hex } => {
                let wire = hex::decode(hex.trim()).context("Invalid hex input")?;
                let meta = MobilityMeta::decode(&wire).context("Failed to decode metadata")?;
                print_meta(&meta, &wire);
            }
        },
        Commands::Params { cmd } => match cmd {
            ParamsCommands::Encode { hop_limit, hint } => {
                let mut params = FloodParams::new(hop_limit);
                params.trace_hint = parse_hint(hint.as_deref())?;
                let wire = params.encode().context("Failed to encode parameters")?;
                println!("{}", hex::encode(&wire));
            }
            ParamsCommands::Decode { hex } => {
                let wire = hex::decode(hex.trim()).context("Invalid hex input")?;
                let params = FloodParams::decode(&wire).context("Failed to decode parameters")?;
                println!("hop limit:  {}", params.hop_limit);
                match &params.trace_hint {
                    Some(hint) => println!("trace hint: {}", hex::encode(hint)),
                    None => println!("trace hint: (absent)"),
                }
                if !params.unknown.is_empty() {
                    println!("unknown:    {} TLV(s)", params.unknown.len());
                }
            }
        },
        Commands::Name { name } => {
            let name = Name::from_string(&name);
            println!("name:       {}", name);
            println!("components: {}", name.len());
            println!("parent:     {}", name.parent());
        }
    }

    Ok(())
}

fn parse_hint(hint: Option<&str>) -> Result<Option<Bytes>> {
    match hint {
        Some(hex_str) => {
            let bytes = hex::decode(hex_str.trim()).context("Invalid trace hint hex")?;
            Ok(Some(Bytes::from(bytes)))
        }
        None => Ok(None),
    }
}

fn print_meta(meta: &MobilityMeta, wire: &[u8]) {
    println!(
        "mobility:   {}",
        if has_mobility_flag(wire) { "yes" } else { "no" }
    );
    match meta.flood_id {
        Some(id) => println!("flood id:   {}", id),
        None => println!("flood id:   (absent)"),
    }
    match meta.new_face_seq {
        Some(seq) => println!("seq:        {}", seq),
        None => println!("seq:        (absent)"),
    }
    match &meta.trace_hint {
        Some(hint) => println!("trace hint: {}", hex::encode(hint)),
        None => println!("trace hint: (absent)"),
    }
    if !meta.unknown.is_empty() {
        println!("unknown:    {} TLV(s)", meta.unknown.len());
    }
}
