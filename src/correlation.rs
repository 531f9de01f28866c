/// Command/response correlation
///
/// Owns the space of in-flight tokens. `send` stamps a fresh token onto
/// the rendered command line and registers a pending request; `dispatch`
/// routes every incoming record either to the pending request with the
/// matching token or to the event sink. The tracker never does I/O and
/// never blocks: resolution arrives through the returned oneshot channel.

use crate::command::MiCommand;
use crate::events::MiEvent;
use crate::types::{MiRecord, MiResultClass, ResultRecord};
use crate::MiError;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// A command accepted for transmission: the wire line with its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    pub token: u32,
    pub line: String,
}

enum Outcome {
    Record(ResultRecord),
    Closed,
}

struct Pending {
    complete: Box<dyn FnOnce(Outcome) + Send>,
}

struct TrackerInner {
    next_token: u32,
    pending: HashMap<u32, Pending>,
    closed: bool,
}

/// Connection-scoped correlator state. Create one per debugger
/// connection; `shutdown` ends its lifecycle and fails everything still
/// outstanding.
pub struct CommandTracker {
    inner: Mutex<TrackerInner>,
    events: mpsc::UnboundedSender<MiEvent>,
}

impl CommandTracker {
    /// Returns the tracker and the receiving end of the event sink that
    /// all async and stream records are forwarded to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MiEvent>) {
        let (events, event_receiver) = mpsc::unbounded_channel();
        let tracker = CommandTracker {
            inner: Mutex::new(TrackerInner {
                next_token: 1,
                pending: HashMap::new(),
                closed: false,
            }),
            events,
        };
        (tracker, event_receiver)
    }

    /// Render `command`, stamp a fresh token onto the line and register
    /// `decode` to run against the matching result record. Returns the
    /// line to write and the channel the decoded result arrives on.
    ///
    /// Raw CLI commands must go through `send_raw`; GDB would read a
    /// token as part of the command text.
    pub fn send<T, F>(
        &self,
        command: &MiCommand,
        decode: F,
    ) -> Result<(SentCommand, oneshot::Receiver<Result<T, MiError>>), MiError>
    where
        F: FnOnce(ResultRecord) -> Result<T, MiError> + Send + 'static,
        T: Send + 'static,
    {
        debug_assert!(!command.is_raw(), "raw commands take no token");
        let rendered = command.encode()?;
        let (tx, rx) = oneshot::channel();

        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(MiError::ConnectionClosed);
        }
        let token = allocate_token(&mut inner);
        let complete = Box::new(move |outcome: Outcome| {
            let result = match outcome {
                Outcome::Closed => Err(MiError::ConnectionClosed),
                Outcome::Record(record) => {
                    if record.class == MiResultClass::Error {
                        let msg = record
                            .error_message()
                            .unwrap_or("unknown error")
                            .to_string();
                        Err(MiError::CommandFailed(msg))
                    } else {
                        decode(record)
                    }
                }
            };
            let _ = tx.send(result);
        });
        inner.pending.insert(token, Pending { complete });
        drop(inner);

        let line = format!("{}{}", token, rendered);
        log::debug!("SEND[{}]: {}", token, line.trim_end());
        Ok((SentCommand { token, line }, rx))
    }

    /// Shorthand for callers that want the raw result record.
    pub fn send_for_record(
        &self,
        command: &MiCommand,
    ) -> Result<(SentCommand, oneshot::Receiver<Result<ResultRecord, MiError>>), MiError> {
        self.send(command, Ok)
    }

    /// Render a raw CLI command. No token, no pending entry; GDB sends
    /// no correlatable answer for these.
    pub fn send_raw(&self, command: &MiCommand) -> Result<String, MiError> {
        let inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(MiError::ConnectionClosed);
        }
        let line = command.encode()?;
        log::debug!("SEND[raw]: {}", line.trim_end());
        Ok(line)
    }

    /// Route one record, in arrival order. Result records resolve their
    /// pending request; everything else goes to the event sink.
    pub fn dispatch(&self, record: MiRecord) {
        match record {
            MiRecord::Result(result) => {
                let Some(token) = result.token else {
                    log::debug!("RECV: result record without token, dropping");
                    return;
                };
                let pending = self.inner.lock().unwrap().pending.remove(&token);
                match pending {
                    Some(p) => {
                        log::debug!("RECV[{}]: class={}", token, result.class);
                        (p.complete)(Outcome::Record(result));
                    }
                    None => {
                        // Legitimate after a cancel or a duplicate answer.
                        log::warn!("RECV[{}]: no pending command, dropping", token);
                    }
                }
            }
            MiRecord::Async(async_record) => {
                log::debug!(
                    "ASYNC: kind={:?}, class={}",
                    async_record.kind,
                    async_record.class
                );
                let _ = self.events.send(MiEvent::Async(async_record));
            }
            MiRecord::Stream(stream) => {
                let _ = self.events.send(MiEvent::Stream(stream));
            }
            MiRecord::Prompt => {}
        }
    }

    /// Abandon a pending request, e.g. on a caller-side timeout. The
    /// receiver resolves with `ConnectionClosed`; a late matching record
    /// is dropped by `dispatch`. Returns whether the token was in flight.
    pub fn cancel(&self, token: u32) -> bool {
        let pending = self.inner.lock().unwrap().pending.remove(&token);
        match pending {
            Some(p) => {
                log::debug!("CANCEL[{}]", token);
                (p.complete)(Outcome::Closed);
                true
            }
            None => false,
        }
    }

    /// Number of requests awaiting a response.
    pub fn outstanding(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    pub fn is_active(&self) -> bool {
        !self.inner.lock().unwrap().closed
    }

    /// Fail every outstanding request with `ConnectionClosed` and refuse
    /// further sends. Idempotent.
    pub fn shutdown(&self) {
        let drained: Vec<Pending> = {
            let mut inner = self.inner.lock().unwrap();
            inner.closed = true;
            inner.pending.drain().map(|(_, p)| p).collect()
        };
        if !drained.is_empty() {
            log::debug!("shutdown: failing {} outstanding command(s)", drained.len());
        }
        for p in drained {
            (p.complete)(Outcome::Closed);
        }
    }
}

impl Drop for CommandTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Monotonic token allocation. Wraps past the integer limit and skips
/// tokens still in flight; zero is never handed out.
fn allocate_token(inner: &mut TrackerInner) -> u32 {
    loop {
        let token = inner.next_token;
        inner.next_token = inner.next_token.checked_add(1).unwrap_or(1);
        if token != 0 && !inner.pending.contains_key(&token) {
            return token;
        }
    }
}
