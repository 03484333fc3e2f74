use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jukebox",
    about = "LAN jukebox: anyone on the network queues videos, the host machine plays them",
    long_about = None,
    version,
)]
pub struct Args {
    /// Address or hostname of the machine allowed to control playback
    #[arg(long, value_name = "ADDR")]
    pub host_ip: Option<String>,

    /// HTTP port to listen on [default: 3000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./jukebox.toml, ~/.config/jukebox/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory with the web UI [default: ./public]
    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces (0.0.0.0 + :::)
    #[arg(long)]
    pub localhost: bool,

    /// Print a bcrypt hash of PASSWORD for the `password_hash` config key and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,

    /// Take the caller address from X-Forwarded-For (only behind a reverse proxy you control)
    #[arg(long)]
    pub trust_proxy: bool,
}
