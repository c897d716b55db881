//! `mesh-split` command line tool.
//!
//! # Commands
//!
//! - `mesh-split split <STL>` - One STL per color region plus a region map
//! - `mesh-split components <STL>` - One STL per connected body
//! - `mesh-split pack <STL>` - 3MF archive with color documents
//! - `mesh-split assign <STL>` - Color assignment JSON only
//! - `mesh-split inspect <STL>` - Size and topology report
//! - `mesh-split presets` - List built-in rule tables
//!
//! Logging goes to stderr and honors `RUST_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mesh_io::VertexMode;
use mesh_region::{load_palette, BoundsSampling, ClassifyConfig, Preset, RuleTable};
use mesh_split::{
    assignment_for, inspect_file, package_file, split_components_file, split_file, stream_split,
    write_json, PackMode, SplitOptions, SplitOutcome, SplitResult,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Split binary STL meshes into per-color regions
#[derive(Parser)]
#[command(name = "mesh-split")]
#[command(about = "Split binary STL meshes into per-color region files", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify triangles by position and write one STL per region
    Split {
        /// Input binary STL
        #[arg(name = "STL")]
        input: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Stream the file in three passes instead of loading it
        #[arg(long)]
        stream: bool,

        /// Compute bounds from the first N triangles only
        #[arg(long, value_name = "N", conflicts_with = "full_bounds")]
        sample: Option<usize>,

        /// Compute bounds from every triangle (default unless streaming)
        #[arg(long)]
        full_bounds: bool,

        /// Classify on a single thread
        #[arg(long)]
        no_parallel: bool,
    },

    /// Write one STL per connected body, colored from a palette
    Components {
        /// Input binary STL
        #[arg(name = "STL")]
        input: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build a 3MF archive with color assignment and painting documents
    Pack {
        /// Input binary STL
        #[arg(name = "STL")]
        input: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        /// How geometry is stored in the archive
        #[arg(long, value_enum, default_value_t = PackModeArg::Mesh)]
        mode: PackModeArg,

        /// Output archive (defaults to <stem>.3mf beside the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write the color assignment document for a rule table
    Assign {
        /// Input binary STL
        #[arg(name = "STL")]
        input: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        /// Output JSON (printed to stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Report triangle count, extents and edge topology
    Inspect {
        /// Input binary STL
        #[arg(name = "STL")]
        input: PathBuf,
    },

    /// List built-in rule tables
    Presets {
        /// Print one preset as a TOML rule file
        #[arg(long, value_name = "PRESET")]
        show: Option<String>,
    },
}

/// Where the rule table comes from.
#[derive(Args)]
struct TableArgs {
    /// Built-in rule table
    #[arg(short, long, default_value = "coarse", conflicts_with = "rules")]
    preset: String,

    /// TOML rule file with [[region]] and [[rule]] entries
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// TOML palette overriding region colors and labels
    #[arg(long)]
    palette: Option<PathBuf>,
}

impl TableArgs {
    fn load(&self) -> Result<RuleTable> {
        let table = match &self.rules {
            Some(path) => RuleTable::load(path)?,
            None => self.preset.parse::<Preset>()?.table(),
        };
        Ok(match &self.palette {
            Some(path) => table.with_palette(&load_palette(path)?),
            None => table,
        })
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory
    #[arg(short, long, default_value = "regions")]
    out: PathBuf,

    /// Output file prefix (defaults to the input stem)
    #[arg(long)]
    base: Option<String>,

    /// Give every triangle its own vertices instead of merging positions
    #[arg(long)]
    soup: bool,

    /// Do not write <base>_region_map.json
    #[arg(long)]
    no_map: bool,

    /// Header text before the region id in each output file
    #[arg(long, value_name = "TEXT", default_value = mesh_split::DEFAULT_HEADER_PREFIX)]
    header: String,
}

impl OutputArgs {
    fn options(&self, classify: ClassifyConfig) -> SplitOptions {
        let mut options = SplitOptions::new(&self.out)
            .with_classify(classify)
            .with_header_prefix(&self.header);
        if let Some(base) = &self.base {
            options = options.with_base_name(base);
        }
        if self.soup {
            options = options.with_vertex_mode(VertexMode::Soup);
        }
        if self.no_map {
            options = options.without_region_map();
        }
        options
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PackModeArg {
    /// Decoded mesh as model XML
    Mesh,
    /// Original STL bytes embedded verbatim
    Reference,
    /// One colored object per region
    Parts,
}

impl From<PackModeArg> for PackMode {
    fn from(mode: PackModeArg) -> Self {
        match mode {
            PackModeArg::Mesh => Self::Mesh,
            PackModeArg::Reference => Self::Reference,
            PackModeArg::Parts => Self::Parts,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Split {
            input,
            table,
            output,
            stream,
            sample,
            full_bounds,
            no_parallel,
        } => {
            let mut classify = if stream {
                ClassifyConfig::streaming()
            } else {
                ClassifyConfig::default()
            };
            if let Some(n) = sample {
                classify = classify.with_bounds(BoundsSampling::FirstTriangles(n));
            } else if full_bounds {
                classify = classify.with_bounds(BoundsSampling::Full);
            }
            classify = classify.with_parallel(!no_parallel);

            let table = table.load()?;
            let options = output.options(classify);
            let result = if stream {
                stream_split(&input, &table, &options)
            } else {
                split_file(&input, &table, &options)
            };
            report(&input, result)
        }
        Commands::Components {
            input,
            table,
            output,
        } => {
            let palette = table.load()?;
            let options = output.options(ClassifyConfig::default());
            report(
                &input,
                split_components_file(&input, palette.regions(), &options),
            )
        }
        Commands::Pack {
            input,
            table,
            mode,
            out,
        } => {
            let table = table.load()?;
            let out = out.unwrap_or_else(|| input.with_extension("3mf"));
            match package_file(&input, &table, mode.into(), &ClassifyConfig::default()) {
                Ok(bytes) => {
                    std::fs::write(&out, bytes)
                        .with_context(|| format!("cannot write {}", out.display()))?;
                    println!("Wrote {}", out.display());
                    Ok(())
                }
                Err(e) if e.is_empty_mesh() => {
                    warn!(path = %input.display(), "mesh has no triangles, nothing to pack");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Assign { input, table, out } => {
            let assignment = assignment_for(&input, &table.load()?);
            if let Some(out) = out {
                write_json(&out, &assignment)?;
                println!("Wrote {}", out.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&assignment)?);
            }
            Ok(())
        }
        Commands::Inspect { input } => {
            print!("{}", inspect_file(&input)?);
            Ok(())
        }
        Commands::Presets { show } => {
            if let Some(name) = show {
                let table = name.parse::<Preset>()?.table();
                print!("{}", table.to_toml_string()?);
            } else {
                for preset in Preset::ALL {
                    let table = preset.table();
                    println!(
                        "{:<10} {} regions  {}",
                        preset.name(),
                        table.region_count(),
                        preset.description()
                    );
                }
            }
            Ok(())
        }
    }
}

fn report(input: &Path, result: SplitResult<SplitOutcome>) -> Result<()> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_empty_mesh() => {
            warn!(path = %input.display(), "mesh has no triangles, nothing written");
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to split {}", input.display())),
    };

    let map = &outcome.region_map;
    println!(
        "{}: {} triangles, {} regions ({})",
        map.original_file,
        map.total_triangles,
        map.regions.len(),
        map.assignment_method
    );
    for record in &map.regions {
        println!(
            "  {:<32} {:>10} triangles {:>6.1}%  {} {}",
            record.filename, record.triangle_count, record.percentage, record.hex, record.label
        );
    }
    if let Some(path) = &outcome.region_map_path {
        info!(path = %path.display(), "region map");
    }

    let failed = &outcome.report.failed;
    if !failed.is_empty() {
        for f in failed {
            eprintln!("  failed {}: {}", f.path.display(), f.error);
        }
        bail!("{} of {} region files could not be written", failed.len(), map.regions.len());
    }
    Ok(())
}
