use std::io;
use std::path::{self, PathBuf};

use clap::Parser;
use jsonfs_fuse::{JsonFs, MountOptions};
use jsonfs_json_store::DocumentStore;

mod logging;

use logging::LogLevel;

/// jsonfs - Mount a JSON document as a filesystem
///
/// Objects and arrays become directories, everything else becomes a file.
/// Changes are written back to the document on fsync and on unmount.
#[derive(Parser, Debug)]
#[command(name = "jsonfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON document to mount
    document: PathBuf,

    /// Directory to mount it on
    mountpoint: PathBuf,

    /// Log level
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Error)]
    log: LogLevel,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,

    /// Unmount automatically when the process exits
    #[arg(long)]
    auto_unmount: bool,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error("cannot load {path}: {source}")]
    Load {
        path: String,
        source: jsonfs_json_store::Error,
    },

    #[error("cannot mount on {path}: {source}")]
    Mount { path: String, source: io::Error },
}

impl Args {
    fn mount_options(&self) -> MountOptions {
        MountOptions {
            allow_other: self.allow_other,
            auto_unmount: self.auto_unmount,
            ..MountOptions::default()
        }
    }
}

fn run(args: &Args) -> Result<(), StartupError> {
    let store = DocumentStore::open(&args.document).map_err(|source| StartupError::Load {
        path: args.document.display().to_string(),
        source,
    })?;

    let mount_error = |source| StartupError::Mount {
        path: args.mountpoint.display().to_string(),
        source,
    };
    let mountpoint = path::absolute(&args.mountpoint).map_err(mount_error)?;
    jsonfs_fuse::mount(JsonFs::new(store), mountpoint, &args.mount_options()).map_err(mount_error)
}

fn main() {
    let args = Args::parse();
    logging::init(args.log);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
