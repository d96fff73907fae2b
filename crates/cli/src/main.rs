use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use vstream::{Server, StreamConfig};

#[derive(Parser)]
#[command(
    name = "vstream-server",
    about = "Streaming server for stored video containers"
)]
struct Args {
    /// Bind address for the control channel (host:port)
    #[arg(long, short, default_value = "0.0.0.0:8554")]
    bind: String,

    /// Directory containing the frame container files
    #[arg(long, short, default_value = ".")]
    media_dir: PathBuf,

    /// Output rate in frames per second
    #[arg(long, default_value_t = 20)]
    fps: u32,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = StreamConfig {
        media_root: args.media_dir,
        frame_interval: Duration::from_millis(1000 / u64::from(args.fps.max(1))),
        ..StreamConfig::default()
    };

    let mut server = Server::with_config(&args.bind, config);

    if let Err(e) = server.start() {
        eprintln!("Failed to start server: {}", e);
        return;
    }

    println!("Streaming server on {} — press Enter to stop", args.bind);
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    server.stop();
}
