/// Transport driver
///
/// Wires a `CommandTracker` to any line-based duplex transport: commands
/// go out through the writer half, a spawned reader task feeds incoming
/// lines through the parser into the tracker. Spawning and owning the
/// debugger process is the caller's business; a session only sees the
/// two stream halves.

use crate::command::MiCommand;
use crate::correlation::CommandTracker;
use crate::events::MiEvent;
use crate::parser::parse_mi_line;
use crate::types::ResultRecord;
use crate::MiError;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub struct MiSession<W> {
    tracker: Arc<CommandTracker>,
    writer: tokio::sync::Mutex<W>,
    reader: JoinHandle<()>,
}

impl<W: AsyncWrite + Unpin> MiSession<W> {
    /// Start a session over the given transport halves. Returns the
    /// session and the event sink all async/stream records arrive on.
    pub fn start<R>(reader: R, writer: W) -> (Self, mpsc::UnboundedReceiver<MiEvent>)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tracker, events) = CommandTracker::new();
        let tracker = Arc::new(tracker);
        let reader = tokio::spawn(read_loop(reader, tracker.clone()));
        (
            MiSession {
                tracker,
                writer: tokio::sync::Mutex::new(writer),
                reader,
            },
            events,
        )
    }

    /// Register and transmit a command; returns the channel its decoded
    /// result arrives on, plus the token for a later `cancel`.
    pub async fn submit<T, F>(
        &self,
        command: &MiCommand,
        decode: F,
    ) -> Result<(u32, oneshot::Receiver<Result<T, MiError>>), MiError>
    where
        F: FnOnce(ResultRecord) -> Result<T, MiError> + Send + 'static,
        T: Send + 'static,
    {
        let (sent, rx) = self.tracker.send(command, decode)?;
        self.write_line(&sent.line).await?;
        Ok((sent.token, rx))
    }

    /// Transmit a command and wait for its decoded result.
    pub async fn execute<T, F>(&self, command: &MiCommand, decode: F) -> Result<T, MiError>
    where
        F: FnOnce(ResultRecord) -> Result<T, MiError> + Send + 'static,
        T: Send + 'static,
    {
        let (_, rx) = self.submit(command, decode).await?;
        rx.await.map_err(|_| MiError::ConnectionClosed)?
    }

    /// Transmit a command and wait for the raw result record.
    pub async fn execute_for_record(&self, command: &MiCommand) -> Result<ResultRecord, MiError> {
        self.execute(command, Ok).await
    }

    /// Transmit a raw CLI command. Nothing to wait for; GDB sends no
    /// correlatable answer.
    pub async fn send_raw(&self, command: &MiCommand) -> Result<(), MiError> {
        let line = self.tracker.send_raw(command)?;
        self.write_line(&line).await
    }

    /// Abandon an in-flight command by token.
    pub fn cancel(&self, token: u32) -> bool {
        self.tracker.cancel(token)
    }

    pub fn is_active(&self) -> bool {
        self.tracker.is_active()
    }

    /// Stop the reader task and fail everything still outstanding.
    pub fn shutdown(&self) {
        self.reader.abort();
        self.tracker.shutdown();
    }

    async fn write_line(&self, line: &str) -> Result<(), MiError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl<W> Drop for MiSession<W> {
    fn drop(&mut self) {
        self.reader.abort();
        self.tracker.shutdown();
    }
}

/// One dedicated reader loop per connection: lines are parsed and
/// dispatched in arrival order. A line that fails to parse is logged and
/// skipped; only end-of-stream tears the connection down.
async fn read_loop<R>(mut reader: R, tracker: Arc<CommandTracker>)
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                log::debug!("transport reached EOF");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                log::debug!("RECV: {}", trimmed);
                match parse_mi_line(trimmed) {
                    Ok(record) => tracker.dispatch(record),
                    Err(e) => log::warn!("skipping unparsable line {:?}: {}", trimmed, e),
                }
            }
            Err(e) => {
                log::error!("transport read error: {}", e);
                break;
            }
        }
    }
    tracker.shutdown();
}
