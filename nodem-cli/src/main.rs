// nodem -- "nodem is NOT a modem". Emulates a Hayes-compatible modem on a
// virtual machine's serial port so the guest can use dial-up software.
//
// Usage:
//   qemu-system-i386 ... -serial unix:/tmp/nodem.sock,server
//   nodem --socket /tmp/nodem.sock
//
//   nodem --listen 127.0.0.1:2323          # one modem per TCP connection
//   nodem --serial /dev/pts/7 --baud 9600  # a pty or real UART
//
// Logging follows RUST_LOG when set, otherwise --log-level.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use nodem_at::{SessionBuilder, SessionExit, SessionHandle, spawn_session};
use nodem_core::Transport;
use nodem_transport::{SerialTransport, TcpTransport, UnixTransport};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// nodem is NOT a modem -- a Hayes modem emulator for virtual machines.
#[derive(Parser, Debug)]
#[command(name = "nodem", version, about)]
struct Cli {
    /// Unix socket to connect to (QEMU `-serial unix:PATH,server`).
    #[arg(short, long, default_value = "/tmp/nodem.sock")]
    socket: PathBuf,

    /// Accept TCP connections on this address instead; each connection
    /// gets its own modem.
    #[arg(short, long, conflicts_with = "serial")]
    listen: Option<String>,

    /// Run on a serial device or pty instead of a socket.
    #[arg(long)]
    serial: Option<String>,

    /// Baud rate for --serial.
    #[arg(long, default_value_t = 115_200, requires = "serial")]
    baud: u32,

    /// Start with command echo off (as if `ATE0` had been sent).
    #[arg(long)]
    no_echo: bool,

    /// Read poll interval in milliseconds; bounds how long shutdown waits.
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(1..))]
    poll_ms: u64,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Where the modem's serial line is.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Socket(PathBuf),
    Listen(String),
    Serial { path: String, baud: u32 },
}

impl Cli {
    fn line(&self) -> Line {
        if let Some(addr) = &self.listen {
            Line::Listen(addr.clone())
        } else if let Some(path) = &self.serial {
            Line::Serial {
                path: path.clone(),
                baud: self.baud,
            }
        } else {
            Line::Socket(self.socket.clone())
        }
    }

    fn session_builder(&self) -> SessionBuilder {
        SessionBuilder::new()
            .echo(!self.no_echo)
            .poll_interval(Duration::from_millis(self.poll_ms))
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Run one modem on an already-open transport until the peer hangs up or
/// we are interrupted.
async fn run_single<T>(transport: T, cli: &Cli, peer: &str, cancel: &CancellationToken) -> Result<()>
where
    T: Transport + 'static,
{
    let session = cli.session_builder().build(transport);
    let span = info_span!("session", peer = %peer);
    let handle = span.in_scope(|| spawn_session(session, cancel.child_token()));

    match handle.join().await.context("modem session failed")? {
        SessionExit::EndOfStream => info!(peer, "peer hung up"),
        SessionExit::Cancelled => info!(peer, "session interrupted"),
    }
    Ok(())
}

/// Pause after a failed accept, e.g. while out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections for listener mode.
trait Acceptor {
    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)>;
}

impl Acceptor for TcpListener {
    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Accept TCP connections and run an independent modem on each.
async fn run_listener(addr: &str, cli: &Cli, cancel: &CancellationToken) -> Result<()> {
    let mut listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;
    info!(addr = %listener.local_addr()?, "listening for connections");

    serve(&mut listener, cli, cancel).await;
    Ok(())
}

/// Run sessions for accepted connections until `cancel` fires, then wait
/// for all of them to stop.
async fn serve<A: Acceptor>(acceptor: &mut A, cli: &Cli, cancel: &CancellationToken) {
    let mut sessions: Vec<SessionHandle> = Vec::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            accepted = acceptor.accept() => match accepted {
                Ok((stream, peer)) => {
                    sessions.retain(|handle| !handle.task.is_finished());

                    let transport = TcpTransport::from_stream(stream, peer.to_string());
                    let session = cli.session_builder().build(transport);
                    let span = info_span!("session", %peer);
                    sessions.push(span.in_scope(|| spawn_session(session, cancel.child_token())));
                    info!(%peer, active = sessions.len(), "connection accepted");
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }

    info!(active = sessions.len(), "waiting for sessions to stop");
    for handle in sessions {
        // Failures were already logged by the session task.
        let _ = handle.join().await;
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter {default_filter:?}"))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
        });
    }

    match cli.line() {
        Line::Socket(path) => {
            let transport = UnixTransport::connect(&path)
                .await
                .with_context(|| format!("failed to connect to {}", path.display()))?;
            run_single(transport, &cli, &path.display().to_string(), &cancel).await
        }
        Line::Serial { path, baud } => {
            let transport = SerialTransport::open(&path, baud)
                .await
                .with_context(|| format!("failed to open {path}"))?;
            run_single(transport, &cli, &path, &cancel).await
        }
        Line::Listen(addr) => run_listener(&addr, &cli, &cancel).await,
    }
}
