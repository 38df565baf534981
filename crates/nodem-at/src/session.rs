//! Per-connection modem session.
//!
//! A [`ModemSession`] owns one transport and one [`ModemState`] and runs the
//! command channel on it:
//!
//! 1. read one byte (the only suspension point),
//! 2. in command mode, echo it if echo is on, then feed it to the framer,
//! 3. when the framer completes a line, dispatch it and send `OK` or
//!    `ERROR` framed with the live S3/S4 characters.
//!
//! A line is fully executed and answered before the next byte is read. The
//! session ends cleanly at end-of-stream, or when its cancellation token
//! fires. Read timeouts only exist so cancellation is noticed promptly.
//!
//! In on-line mode bytes bypass the command channel and go to a
//! [`DataRelay`]. Nothing in the command language enters on-line mode; it
//! is driven by whatever establishes the data link.

use std::time::Duration;

use nodem_core::error::{Error, Result};
use nodem_core::transport::Transport;
use nodem_core::{ChannelState, ModemState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, trace, warn};

use crate::dispatcher::CommandDispatcher;
use crate::framer::{Frame, LineFramer};
use crate::protocol::{Response, encode_response};

/// Default interval between cancellation checks while the line is idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Sink for bytes received while the session is on-line.
pub trait DataRelay: Send + 'static {
    fn relay(&mut self, byte: u8);
}

/// Relay that drops every byte.
#[derive(Debug, Default)]
pub struct DiscardRelay;

impl DataRelay for DiscardRelay {
    fn relay(&mut self, _byte: u8) {}
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The peer closed the stream.
    EndOfStream,
    /// The session's cancellation token fired.
    Cancelled,
}

/// Fluent builder for [`ModemSession`].
///
/// ```
/// use nodem_at::session::{SessionBuilder, SessionExit};
/// use nodem_test_harness::MockTransport;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> nodem_core::Result<()> {
/// let mut session = SessionBuilder::new()
///     .echo(false)
///     .poll_interval(Duration::from_millis(100))
///     .build(MockTransport::with_input(b"ATE0\r"));
/// assert_eq!(session.run().await?, SessionExit::EndOfStream);
/// assert_eq!(session.transport().sent_bytes(), b"\r\nOK\r\n");
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    echo: bool,
    poll_interval: Duration,
    relay: Box<dyn DataRelay>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder {
            echo: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            relay: Box::new(DiscardRelay),
        }
    }

    /// Initial echo setting (default: on).
    pub fn echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }

    /// How long a single read may block before cancellation is checked
    /// again (default: 250ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Where on-line bytes go (default: discarded).
    pub fn relay(mut self, relay: impl DataRelay) -> Self {
        self.relay = Box::new(relay);
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> ModemSession<T> {
        ModemSession {
            transport,
            state: ModemState::new(self.echo),
            channel: ChannelState::Command,
            framer: LineFramer::new(),
            dispatcher: CommandDispatcher::new(),
            relay: self.relay,
            poll_interval: self.poll_interval,
            lines_processed: 0,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One emulated modem attached to one transport.
pub struct ModemSession<T> {
    transport: T,
    state: ModemState,
    channel: ChannelState,
    framer: LineFramer,
    dispatcher: CommandDispatcher,
    relay: Box<dyn DataRelay>,
    poll_interval: Duration,
    lines_processed: u64,
}

impl<T: Transport> ModemSession<T> {
    /// Create a session with default settings.
    pub fn new(transport: T) -> Self {
        SessionBuilder::new().build(transport)
    }

    pub fn state(&self) -> &ModemState {
        &self.state
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel
    }

    /// Switch between command and on-line mode.
    ///
    /// Entering on-line mode drops any partially typed command line.
    pub fn set_channel_state(&mut self, channel: ChannelState) {
        if channel != self.channel {
            info!(from = %self.channel, to = %channel, "channel state changed");
            self.framer.clear();
            self.channel = channel;
        }
    }

    /// The last accepted command line, as `A/` would replay it.
    pub fn last_command(&self) -> Option<&str> {
        self.dispatcher.last_command()
    }

    /// Number of command lines answered so far.
    pub fn lines_processed(&self) -> u64 {
        self.lines_processed
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run until end-of-stream.
    pub async fn run(&mut self) -> Result<SessionExit> {
        self.run_until_cancelled(&CancellationToken::new()).await
    }

    /// Run until end-of-stream or until `cancel` fires.
    ///
    /// Both outcomes close the transport and return `Ok`. Any other
    /// transport error ends the session and is returned.
    pub async fn run_until_cancelled(&mut self, cancel: &CancellationToken) -> Result<SessionExit> {
        info!("modem session started");
        let mut byte = [0u8; 1];

        let exit = loop {
            let received = tokio::select! {
                biased;

                _ = cancel.cancelled() => break SessionExit::Cancelled,

                r = self.transport.receive(&mut byte, self.poll_interval) => r,
            };

            match received {
                Ok(_) => self.handle_byte(byte[0]).await?,
                Err(Error::Timeout) => continue,
                Err(e) if e.is_end_of_stream() => break SessionExit::EndOfStream,
                Err(e) => return Err(e),
            }
        };

        info!(?exit, lines = self.lines_processed, "modem session ended");
        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "error closing transport");
        }
        Ok(exit)
    }

    /// Process one byte received from the transport.
    pub async fn handle_byte(&mut self, byte: u8) -> Result<()> {
        match self.channel {
            ChannelState::OnLine => {
                self.relay.relay(byte);
                return Ok(());
            }
            ChannelState::Command => {}
        }

        trace!(byte, "command byte");
        if self.state.settings.echo {
            self.transport.send(&[byte]).await?;
        }

        match self.framer.push(byte, &self.state.registers) {
            Some(Frame::Line(line)) => self.process_line(&line).await,
            Some(Frame::Overflow) => self.respond(Response::Error).await,
            None => Ok(()),
        }
    }

    async fn process_line(&mut self, line: &str) -> Result<()> {
        let response = match self.dispatcher.dispatch(line, &mut self.state) {
            Ok(()) => Response::Ok,
            Err(e) => {
                debug!(line, error = %e, "command rejected");
                Response::Error
            }
        };
        self.respond(response).await
    }

    async fn respond(&mut self, response: Response) -> Result<()> {
        self.lines_processed += 1;

        let bytes = encode_response(response, &self.state.registers);
        self.transport.send(&bytes).await
    }
}

/// Handle to a session running in its own task.
pub struct SessionHandle {
    /// Cancels the session; it stops at its next poll.
    pub cancel: CancellationToken,
    /// Join handle for the session task.
    pub task: JoinHandle<Result<SessionExit>>,
}

impl SessionHandle {
    /// Wait for the session to end on its own.
    pub async fn join(self) -> Result<SessionExit> {
        self.task
            .await
            .map_err(|e| Error::Transport(format!("session task failed: {e}")))?
    }

    /// Cancel the session and wait for it to stop.
    pub async fn shutdown(self) -> Result<SessionExit> {
        self.cancel.cancel();
        self.join().await
    }
}

/// Spawn `session` on the tokio runtime, inside the current tracing span.
///
/// The session stops when `cancel` (or a parent token) fires.
pub fn spawn_session<T>(mut session: ModemSession<T>, cancel: CancellationToken) -> SessionHandle
where
    T: Transport + 'static,
{
    let token = cancel.clone();
    let task = tokio::spawn(
        async move {
            let result = session.run_until_cancelled(&token).await;
            if let Err(e) = &result {
                warn!(error = %e, "modem session failed");
            }
            result
        }
        .in_current_span(),
    );
    SessionHandle { cancel, task }
}
