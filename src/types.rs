/// GDB/MI data model
///
/// This module defines the structured representation of GDB/MI output:
/// the value tree (const/tuple/list) and the record types produced by
/// the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value inside an MI record: a quoted constant, a tuple of named
/// values, or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MiValue {
    Const(String),
    Tuple(MiTuple),
    List(MiList),
}

impl MiValue {
    /// Get the value as a string constant, if possible
    pub fn as_const(&self) -> Option<&str> {
        match self {
            MiValue::Const(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a tuple, if possible
    pub fn as_tuple(&self) -> Option<&MiTuple> {
        match self {
            MiValue::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// Get the value as a list, if possible
    pub fn as_list(&self) -> Option<&MiList> {
        match self {
            MiValue::List(l) => Some(l),
            _ => None,
        }
    }
}

/// One `variable=value` pair. The variable may be empty when GDB emits a
/// bare value where a pair is normally expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiResult {
    pub variable: String,
    pub value: MiValue,
}

impl MiResult {
    pub fn new(variable: impl Into<String>, value: MiValue) -> Self {
        Self {
            variable: variable.into(),
            value,
        }
    }
}

/// An ordered tuple of `variable=value` pairs. Names are not necessarily
/// unique (`thread-ids={thread-id="2",thread-id="1"}`), so this is a
/// sequence rather than a map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MiTuple(pub Vec<MiResult>);

impl MiTuple {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MiResult> {
        self.0.iter()
    }

    /// First value stored under `variable`, if any.
    pub fn get(&self, variable: &str) -> Option<&MiValue> {
        self.0
            .iter()
            .find(|r| r.variable == variable)
            .map(|r| &r.value)
    }

    /// First string constant stored under `variable`, if any.
    pub fn get_string(&self, variable: &str) -> Option<&str> {
        self.get(variable).and_then(MiValue::as_const)
    }
}

/// A list element: either a bare value or a named pair. GDB emits both
/// shapes (`["a","b"]` and `[frame={...},frame={...}]`) and a list is
/// homogeneous in practice, but the parser does not assume which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MiListEntry {
    Value(MiValue),
    Result(MiResult),
}

impl MiListEntry {
    /// The payload value, ignoring the name of a named entry.
    pub fn value(&self) -> &MiValue {
        match self {
            MiListEntry::Value(v) => v,
            MiListEntry::Result(r) => &r.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MiList(pub Vec<MiListEntry>);

impl MiList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MiListEntry> {
        self.0.iter()
    }

    /// Iterate the payload values, ignoring entry names.
    pub fn values(&self) -> impl Iterator<Item = &MiValue> {
        self.0.iter().map(MiListEntry::value)
    }
}

/// Find the first value stored under `variable` in a record's field list.
pub fn find_result<'a>(results: &'a [MiResult], variable: &str) -> Option<&'a MiValue> {
    results
        .iter()
        .find(|r| r.variable == variable)
        .map(|r| &r.value)
}

/// Result classes of a `^` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

impl MiResultClass {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "done" => Some(MiResultClass::Done),
            "running" => Some(MiResultClass::Running),
            "connected" => Some(MiResultClass::Connected),
            "error" => Some(MiResultClass::Error),
            "exit" => Some(MiResultClass::Exit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MiResultClass::Done => "done",
            MiResultClass::Running => "running",
            MiResultClass::Connected => "connected",
            MiResultClass::Error => "error",
            MiResultClass::Exit => "exit",
        }
    }
}

impl fmt::Display for MiResultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `^` record: the answer to a previously sent command.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub token: Option<u32>,
    pub class: MiResultClass,
    pub results: Vec<MiResult>,
}

impl ResultRecord {
    pub fn find(&self, variable: &str) -> Option<&MiValue> {
        find_result(&self.results, variable)
    }

    pub fn find_string(&self, variable: &str) -> Option<&str> {
        self.find(variable).and_then(MiValue::as_const)
    }

    /// The human-readable reason carried by an `^error` record. GDB uses
    /// the `msg` field; some front ends have seen `message`.
    pub fn error_message(&self) -> Option<&str> {
        self.find_string("msg").or_else(|| self.find_string("message"))
    }
}

/// Which of the three async record flavors a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncKind {
    /// `*` — execution state changes (running, stopped)
    Exec,
    /// `+` — progress of a still-running command
    Status,
    /// `=` — out-of-band notifications (library loaded, thread created, ...)
    Notify,
}

/// A `*`, `+` or `=` record. The class is the event name as sent by GDB;
/// typed interpretation lives in the events module.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncRecord {
    pub token: Option<u32>,
    pub kind: AsyncKind,
    pub class: String,
    pub results: Vec<MiResult>,
}

impl AsyncRecord {
    pub fn find(&self, variable: &str) -> Option<&MiValue> {
        find_result(&self.results, variable)
    }

    pub fn find_string(&self, variable: &str) -> Option<&str> {
        self.find(variable).and_then(MiValue::as_const)
    }
}

/// Types of GDB/MI streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// `~` prefix: text the CLI would have printed
    Console,
    /// `@` prefix: output of the debugged program
    Target,
    /// `&` prefix: GDB's own log/echo text
    Log,
}

/// A stream record: raw decoded text, no structured fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub kind: StreamKind,
    pub text: String,
}

/// One parsed line of MI output
#[derive(Debug, Clone, PartialEq)]
pub enum MiRecord {
    Result(ResultRecord),
    Async(AsyncRecord),
    Stream(StreamRecord),
    /// The `(gdb)` terminator; marks the end of an output batch.
    Prompt,
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                write!(f, "\\{:03o}", c as u32)?
            }
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

/// Re-serializes the value tree back to MI syntax. The output of parsing
/// followed by formatting is accepted by the parser again.
impl fmt::Display for MiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiValue::Const(s) => write_escaped(f, s),
            MiValue::Tuple(t) => {
                f.write_str("{")?;
                for (i, r) in t.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", r)?;
                }
                f.write_str("}")
            }
            MiValue::List(l) => {
                f.write_str("[")?;
                for (i, entry) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    match entry {
                        MiListEntry::Value(v) => write!(f, "{}", v)?,
                        MiListEntry::Result(r) => write!(f, "{}", r)?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for MiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variable.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}={}", self.variable, self.value)
        }
    }
}
