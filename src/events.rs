/// Async record interpretation
///
/// Exec/status/notify and stream records are never correlated to a
/// command; they are forwarded to the registered event sink in arrival
/// order. This module gives the sink typed views over the raw records.
/// Interpretation is best-effort: an unknown class or a missing field
/// degrades to the raw record, never to a lost event.

use crate::output::Frame;
use crate::types::{AsyncRecord, MiValue, StreamRecord};
use std::fmt;

/// What the correlator forwards to the event sink.
#[derive(Debug, Clone, PartialEq)]
pub enum MiEvent {
    Async(AsyncRecord),
    Stream(StreamRecord),
}

/// Known async record classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncClass {
    // Exec async records
    Running,
    Stopped,

    // Notify async records
    ThreadGroupAdded,
    ThreadGroupRemoved,
    ThreadGroupStarted,
    ThreadGroupExited,
    ThreadCreated,
    ThreadExited,
    ThreadSelected,
    LibraryLoaded,
    LibraryUnloaded,
    TraceframeChanged,
    TsvCreated,
    TsvDeleted,
    TsvModified,
    BreakpointCreated,
    BreakpointModified,
    BreakpointDeleted,
    RecordStarted,
    RecordStopped,
    CmdParamChanged,
    MemoryChanged,
}

impl AsyncClass {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(AsyncClass::Running),
            "stopped" => Some(AsyncClass::Stopped),
            "thread-group-added" => Some(AsyncClass::ThreadGroupAdded),
            "thread-group-removed" => Some(AsyncClass::ThreadGroupRemoved),
            "thread-group-started" => Some(AsyncClass::ThreadGroupStarted),
            "thread-group-exited" => Some(AsyncClass::ThreadGroupExited),
            "thread-created" => Some(AsyncClass::ThreadCreated),
            "thread-exited" => Some(AsyncClass::ThreadExited),
            "thread-selected" => Some(AsyncClass::ThreadSelected),
            "library-loaded" => Some(AsyncClass::LibraryLoaded),
            "library-unloaded" => Some(AsyncClass::LibraryUnloaded),
            "traceframe-changed" => Some(AsyncClass::TraceframeChanged),
            "tsv-created" => Some(AsyncClass::TsvCreated),
            "tsv-deleted" => Some(AsyncClass::TsvDeleted),
            "tsv-modified" => Some(AsyncClass::TsvModified),
            "breakpoint-created" => Some(AsyncClass::BreakpointCreated),
            "breakpoint-modified" => Some(AsyncClass::BreakpointModified),
            "breakpoint-deleted" => Some(AsyncClass::BreakpointDeleted),
            "record-started" => Some(AsyncClass::RecordStarted),
            "record-stopped" => Some(AsyncClass::RecordStopped),
            "cmd-param-changed" => Some(AsyncClass::CmdParamChanged),
            "memory-changed" => Some(AsyncClass::MemoryChanged),
            _ => None,
        }
    }
}

/// Why the target stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BreakpointHit,
    WatchpointTrigger,
    ReadWatchpointTrigger,
    AccessWatchpointTrigger,
    FunctionFinished,
    LocationReached,
    WatchpointScope,
    EndSteppingRange,
    ExitedSignalled,
    Exited,
    ExitedNormally,
    SignalReceived,
    SolibEvent,
    Fork,
    Vfork,
    SyscallEntry,
    SyscallReturn,
    Exec,
    NoHistory,
}

impl StopReason {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "breakpoint-hit" => Some(StopReason::BreakpointHit),
            "watchpoint-trigger" => Some(StopReason::WatchpointTrigger),
            "read-watchpoint-trigger" => Some(StopReason::ReadWatchpointTrigger),
            "access-watchpoint-trigger" => Some(StopReason::AccessWatchpointTrigger),
            "function-finished" => Some(StopReason::FunctionFinished),
            "location-reached" => Some(StopReason::LocationReached),
            "watchpoint-scope" => Some(StopReason::WatchpointScope),
            "end-stepping-range" => Some(StopReason::EndSteppingRange),
            "exited-signalled" => Some(StopReason::ExitedSignalled),
            "exited" => Some(StopReason::Exited),
            "exited-normally" => Some(StopReason::ExitedNormally),
            "signal-received" => Some(StopReason::SignalReceived),
            "solib-event" => Some(StopReason::SolibEvent),
            "fork" => Some(StopReason::Fork),
            "vfork" => Some(StopReason::Vfork),
            "syscall-entry" => Some(StopReason::SyscallEntry),
            "syscall-return" => Some(StopReason::SyscallReturn),
            "exec" => Some(StopReason::Exec),
            "no-history" => Some(StopReason::NoHistory),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::BreakpointHit => "breakpoint-hit",
            StopReason::WatchpointTrigger => "watchpoint-trigger",
            StopReason::ReadWatchpointTrigger => "read-watchpoint-trigger",
            StopReason::AccessWatchpointTrigger => "access-watchpoint-trigger",
            StopReason::FunctionFinished => "function-finished",
            StopReason::LocationReached => "location-reached",
            StopReason::WatchpointScope => "watchpoint-scope",
            StopReason::EndSteppingRange => "end-stepping-range",
            StopReason::ExitedSignalled => "exited-signalled",
            StopReason::Exited => "exited",
            StopReason::ExitedNormally => "exited-normally",
            StopReason::SignalReceived => "signal-received",
            StopReason::SolibEvent => "solib-event",
            StopReason::Fork => "fork",
            StopReason::Vfork => "vfork",
            StopReason::SyscallEntry => "syscall-entry",
            StopReason::SyscallReturn => "syscall-return",
            StopReason::Exec => "exec",
            StopReason::NoHistory => "no-history",
        };
        write!(f, "{}", s)
    }
}

/// Typed view of a `*stopped` record
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedEvent {
    pub reason: Option<StopReason>,
    pub thread_id: Option<String>,
    pub stopped_threads: Option<String>,
    pub breakpoint_number: Option<String>,
    pub frame: Option<Frame>,
    pub exit_code: Option<i32>,
    pub signal_name: Option<String>,
    pub signal_meaning: Option<String>,
}

impl StoppedEvent {
    /// `None` when the record is not a `*stopped` event.
    pub fn from_record(record: &AsyncRecord) -> Option<Self> {
        if record.class != "stopped" {
            return None;
        }
        Some(StoppedEvent {
            reason: record.find_string("reason").and_then(StopReason::from_str),
            thread_id: record.find_string("thread-id").map(str::to_string),
            stopped_threads: record.find_string("stopped-threads").map(str::to_string),
            breakpoint_number: record.find_string("bkptno").map(str::to_string),
            frame: record
                .find("frame")
                .and_then(MiValue::as_tuple)
                .and_then(|t| Frame::from_tuple(t).ok()),
            exit_code: record.find_string("exit-code").and_then(|s| s.parse().ok()),
            signal_name: record.find_string("signal-name").map(str::to_string),
            signal_meaning: record.find_string("signal-meaning").map(str::to_string),
        })
    }
}

/// The thread a `*running` record refers to (`"all"` for every thread).
pub fn running_thread(record: &AsyncRecord) -> Option<String> {
    if record.class != "running" {
        return None;
    }
    record.find_string("thread-id").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mi_line;
    use crate::types::MiRecord;

    fn async_record(line: &str) -> AsyncRecord {
        match parse_mi_line(line).unwrap() {
            MiRecord::Async(r) => r,
            other => panic!("expected async record, got {:?}", other),
        }
    }

    #[test]
    fn stop_reason_round_trips() {
        let reasons = [
            ("breakpoint-hit", StopReason::BreakpointHit),
            ("end-stepping-range", StopReason::EndSteppingRange),
            ("exited-normally", StopReason::ExitedNormally),
            ("signal-received", StopReason::SignalReceived),
        ];
        for (text, reason) in reasons {
            assert_eq!(StopReason::from_str(text), Some(reason));
            assert_eq!(reason.to_string(), text);
        }
        assert_eq!(StopReason::from_str("made-up"), None);
    }

    #[test]
    fn stopped_event_with_frame() {
        let record = async_record(
            r#"*stopped,reason="breakpoint-hit",disp="keep",bkptno="1",thread-id="1",stopped-threads="all",frame={addr="0x08048564",func="main",file="myprog.c",line="68"}"#,
        );
        let event = StoppedEvent::from_record(&record).unwrap();
        assert_eq!(event.reason, Some(StopReason::BreakpointHit));
        assert_eq!(event.thread_id.as_deref(), Some("1"));
        assert_eq!(event.breakpoint_number.as_deref(), Some("1"));
        let frame = event.frame.unwrap();
        assert_eq!(frame.func.as_deref(), Some("main"));
        assert_eq!(frame.line, Some(68));
    }

    #[test]
    fn stopped_event_with_signal() {
        let record = async_record(
            r#"*stopped,reason="signal-received",signal-name="SIGSEGV",signal-meaning="Segmentation fault",thread-id="1""#,
        );
        let event = StoppedEvent::from_record(&record).unwrap();
        assert_eq!(event.reason, Some(StopReason::SignalReceived));
        assert_eq!(event.signal_name.as_deref(), Some("SIGSEGV"));
        assert_eq!(event.signal_meaning.as_deref(), Some("Segmentation fault"));
    }

    #[test]
    fn unknown_stop_reason_degrades_to_none() {
        let record = async_record(r#"*stopped,reason="quantum-tunneled""#);
        let event = StoppedEvent::from_record(&record).unwrap();
        assert_eq!(event.reason, None);
    }

    #[test]
    fn running_record_is_not_a_stopped_event() {
        let record = async_record(r#"*running,thread-id="all""#);
        assert!(StoppedEvent::from_record(&record).is_none());
        assert_eq!(running_thread(&record).as_deref(), Some("all"));
    }

    #[test]
    fn async_class_parsing() {
        assert_eq!(
            AsyncClass::from_str("thread-group-started"),
            Some(AsyncClass::ThreadGroupStarted)
        );
        assert_eq!(
            AsyncClass::from_str("library-loaded"),
            Some(AsyncClass::LibraryLoaded)
        );
        assert_eq!(AsyncClass::from_str("definitely-new"), None);
    }
}
