//! Mount command for the mongofs FUSE filesystem.

use std::path::PathBuf;

use mongofs_config::MongoFsConfig;

/// Mount arguments.
pub struct MountArgs {
    /// Mount point path.
    pub mountpoint: PathBuf,
    /// Run in foreground (don't daemonize).
    pub foreground: bool,
}

/// Run the mount command. Blocks until the filesystem is unmounted.
#[cfg(unix)]
pub fn run(config: MongoFsConfig, args: MountArgs) -> Result<(), Box<dyn std::error::Error>> {
    use mongofs_fuse::MongoFuse;

    if !args.mountpoint.exists() {
        std::fs::create_dir_all(&args.mountpoint)?;
    }

    let fs = MongoFuse::from_config(&config)?;

    if args.foreground {
        fs.mount_foreground(&args.mountpoint)?;
    } else {
        fs.mount(&args.mountpoint)?;
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn run(_config: MongoFsConfig, _args: MountArgs) -> Result<(), Box<dyn std::error::Error>> {
    Err("FUSE mounting is only supported on Unix platforms".into())
}
