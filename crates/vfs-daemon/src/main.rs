use anyhow::Result;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use vfs_daemon::server::DaemonServer;
use vfs_daemon::{stdin, Args};
use vfs_service::VfsService;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.level())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting VFS daemon");

    let config = args.load_config()?;
    let service = VfsService::from_config(&config)?;
    info!(volumes = ?config.volumes, "file system ready");

    if args.stdin_mode {
        info!("Running in stdin mode as {}", args.user);
        stdin::run_stdin_mode(service, &args.user).await?;
    } else {
        info!(
            "Running in socket mode, socket path: {}",
            args.socket_path.display()
        );
        run_socket_mode(args, service).await?;
    }

    Ok(())
}

async fn run_socket_mode(args: Args, service: VfsService) -> Result<()> {
    let mut server = DaemonServer::new(args.socket_path, service)?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            server.shutdown().await?;
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            server.shutdown().await?;
        }
    }

    Ok(())
}
