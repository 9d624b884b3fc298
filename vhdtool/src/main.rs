use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use vhd::{FixedVhd, FooterOptions, GeometryPolicy, LayoutPolicy, PageBlobLayout, VhdFooter};

#[derive(Parser, Debug)]
#[command(name = "vhdtool", version, about = "Create and inspect fixed-format VHD images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a bare 512-byte footer for a disk of the given size.
    Footer {
        #[command(flatten)]
        size: SizeArgs,
        #[command(flatten)]
        footer: FooterArgs,
        /// Output file, stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the page blob layout for a disk of the given size.
    Layout {
        #[command(flatten)]
        size: SizeArgs,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Create an empty fixed VHD.
    Create {
        output: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        #[command(flatten)]
        footer: FooterArgs,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Append a footer to a raw disk image.
    Wrap {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        footer: FooterArgs,
    },
    /// Strip the footer from a fixed VHD.
    Unwrap { input: PathBuf, output: PathBuf },
    /// Print the footer of a fixed VHD.
    Inspect { input: PathBuf },
}

#[derive(Args, Debug)]
struct SizeArgs {
    /// Disk size in bytes.
    #[arg(long, conflicts_with = "gib", required_unless_present = "gib")]
    bytes: Option<u64>,
    /// Disk size in GiB.
    #[arg(long)]
    gib: Option<u64>,
}

impl SizeArgs {
    fn capacity(&self) -> anyhow::Result<u64> {
        match (self.bytes, self.gib) {
            (Some(bytes), _) => Ok(bytes),
            (None, Some(gib)) => Ok(vhd::capacity_from_gib(gib)?),
            (None, None) => anyhow::bail!("either --bytes or --gib is required"),
        }
    }
}

#[derive(Args, Debug)]
struct FooterArgs {
    /// Creator application tag, at most 4 ASCII characters.
    #[arg(long, default_value = "wa")]
    creator_app: String,
    /// Creator host OS tag, at most 4 ASCII characters.
    #[arg(long, default_value = "Wi2k")]
    creator_os: String,
    /// Derive the CHS geometry from the disk size instead of the fixed legacy value.
    #[arg(long)]
    derive_geometry: bool,
}

impl FooterArgs {
    fn options(&self) -> anyhow::Result<FooterOptions> {
        Ok(FooterOptions {
            creator_app: tag(&self.creator_app)?,
            creator_os: tag(&self.creator_os)?,
            geometry: if self.derive_geometry {
                GeometryPolicy::Derived
            } else {
                GeometryPolicy::Legacy
            },
            ..Default::default()
        })
    }
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Largest disk accepted, in GiB.
    #[arg(long, default_value_t = 2040)]
    max_gib: u64,
}

impl PolicyArgs {
    fn policy(&self) -> anyhow::Result<LayoutPolicy> {
        Ok(LayoutPolicy {
            max_capacity: vhd::capacity_from_gib(self.max_gib)?,
        })
    }
}

fn tag(value: &str) -> anyhow::Result<[u8; 4]> {
    anyhow::ensure!(
        value.is_ascii() && value.len() <= 4,
        "tag {value:?} must be at most 4 ASCII characters"
    );
    let mut out = [0u8; 4];
    out[..value.len()].copy_from_slice(value.as_bytes());
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Footer {
            size,
            footer,
            output,
        } => {
            let bytes = vhd::generate_footer_with(size.capacity()?, &footer.options()?);
            match output {
                Some(path) => std::fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => std::io::stdout().lock().write_all(&bytes)?,
            }
        }
        Command::Layout { size, policy } => {
            let layout = PageBlobLayout::new(size.capacity()?, &policy.policy()?)?;
            let footer = layout.footer_range();
            println!("capacity:  {}", layout.capacity);
            println!("blob size: {}", layout.blob_size);
            println!("footer:    {}-{}", footer.start(), footer.end());
        }
        Command::Create {
            output,
            size,
            footer,
            policy,
        } => {
            let layout = PageBlobLayout::new(size.capacity()?, &policy.policy()?)?;
            let mut file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let footer = vhd::create_blank(&mut file, &layout, &footer.options()?)?;
            info!(
                "Created {} ({} bytes, id {})",
                output.display(),
                layout.blob_size,
                footer.unique_id
            );
        }
        Command::Wrap {
            input,
            output,
            footer,
        } => {
            let mut reader = BufReader::new(
                File::open(&input).with_context(|| format!("Failed to open {}", input.display()))?,
            );
            let mut writer = BufWriter::new(
                File::create(&output)
                    .with_context(|| format!("Failed to create {}", output.display()))?,
            );
            let footer = vhd::wrap_raw(&mut reader, &mut writer, &footer.options()?)?;
            info!(
                "Wrapped {} into {} ({} byte disk)",
                input.display(),
                output.display(),
                footer.capacity()
            );
        }
        Command::Unwrap { input, output } => {
            let disk = open_vhd(&input)?;
            let mut writer = BufWriter::new(
                File::create(&output)
                    .with_context(|| format!("Failed to create {}", output.display()))?,
            );
            let written = disk.unwrap_to(&mut writer)?;
            writer.flush()?;
            info!("Extracted {written} bytes to {}", output.display());
        }
        Command::Inspect { input } => {
            let disk = open_vhd(&input)?;
            print_footer(disk.footer());
        }
    }

    Ok(())
}

fn open_vhd(path: &Path) -> anyhow::Result<FixedVhd<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    FixedVhd::open_file(file).with_context(|| format!("{} is not a fixed VHD", path.display()))
}

fn print_footer(footer: &VhdFooter) {
    let geometry = footer.geometry();
    let created = footer
        .created_at()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    println!("cookie:          {}", String::from_utf8_lossy(&footer.cookie));
    println!("features:        {:#010x}", footer.features.get());
    println!("version:         {:#010x}", footer.format_version.get());
    println!("data offset:     {:#018x}", footer.data_offset.get());
    println!("timestamp:       {} (unix {created})", footer.timestamp.get());
    println!(
        "creator:         {:?} v{:#010x} on {:?}",
        String::from_utf8_lossy(&footer.creator_app),
        footer.creator_version.get(),
        String::from_utf8_lossy(&footer.creator_os)
    );
    println!("size:            {}", footer.capacity());
    println!(
        "geometry:        {}/{}/{} ({} bytes)",
        geometry.cylinders,
        geometry.heads,
        geometry.sectors_per_track,
        geometry.capacity()
    );
    if geometry.capacity() > footer.capacity() {
        println!("warning:         geometry addresses more than the disk size");
    }
    println!("disk type:       {}", footer.disk_type.get());
    println!("checksum:        {:#010x}", footer.checksum.get());
    println!("unique id:       {}", footer.unique_id);
}
