pub(crate) mod error;
pub(crate) mod hex;
pub(crate) mod image;

use clap::Parser;
use env_logger::Env;
use main_error::MainError;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::hex::{hexcrc::crc32, HexStore};
use crate::image::{AddressRange, Image, Plan, Request, Segment};

// -- Data types for command-line options -- //
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate images for RigDFU bootloader", long_about = None)]
struct Args {
    /// Hex file(s) to load
    #[arg(value_name = "HEXFILE", required = true)]
    hexfiles: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "BIN")]
    output: PathBuf,

    /// Print less output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbosity of generated output?
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Include softdevice
    #[arg(short, long, help_heading = "Images to include (default: guessed from the HEX files)")]
    softdevice: bool,

    /// Include bootloader
    #[arg(short, long, help_heading = "Images to include (default: guessed from the HEX files)")]
    bootloader: bool,

    /// Include application
    #[arg(short, long, help_heading = "Images to include (default: guessed from the HEX files)")]
    application: bool,

    /// Softdevice location, e.g. 0x1000-0x16000
    #[arg(short = 'S', long, value_name = "LOW-HIGH", help_heading = "Image locations")]
    softdevice_addr: Option<AddressRange>,

    /// Bootloader location
    #[arg(short = 'B', long, value_name = "LOW-HIGH", help_heading = "Image locations")]
    bootloader_addr: Option<AddressRange>,

    /// Application location, e.g. 0x16000-0x3b000
    #[arg(short = 'A', long, value_name = "LOW-HIGH", help_heading = "Image locations")]
    application_addr: Option<AddressRange>,
}

impl Args {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn request(&self) -> Request {
        Request {
            softdevice: Segment::new(self.softdevice, self.softdevice_addr),
            bootloader: Segment::new(self.bootloader, self.bootloader_addr),
            application: Segment::new(self.application, self.application_addr),
        }
    }
}

fn generate(args: &Args) -> Result<(), Error> {
    let store = HexStore::load(&args.hexfiles)?;
    let plan = Plan::resolve(&store, args.request())?;
    let image = Image::assemble(&store, &plan);

    for (kind, data) in image.segments() {
        if !data.is_empty() {
            log::info!("{:>12}: CRC32 = 0x{:08X}", kind, crc32(data));
        }
    }

    // Nothing is written unless the whole image could be built, and the
    // output only appears once it is complete
    let bytes = image.to_bytes();
    write_atomically(&args.output, &bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn main() -> Result<(), MainError> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();

    generate(&args)?;
    Ok(())
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
