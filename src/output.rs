/// Decoded command results
///
/// Application-level views over a result record's value tree, one decoder
/// per command family. Decoders require the fields a caller cannot work
/// without and default the rest, since GDB's exact output varies across
/// versions.

use crate::types::{MiResultClass, MiTuple, MiValue, ResultRecord};
use crate::MiError;
use serde::{Deserialize, Serialize};

/// Breakpoint information from `-break-insert` / `-break-list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub number: String,
    pub breakpoint_type: String,
    pub disposition: String,
    pub enabled: bool,
    pub addr: Option<String>,
    pub func: Option<String>,
    pub file: Option<String>,
    pub fullname: Option<String>,
    pub line: Option<u32>,
    pub thread_groups: Vec<String>,
    pub times: u32,
    pub condition: Option<String>,
    pub ignore_count: Option<u32>,
    pub original_location: Option<String>,
}

impl Breakpoint {
    pub fn from_tuple(tuple: &MiTuple) -> Result<Self, MiError> {
        let number = tuple
            .get_string("number")
            .ok_or(MiError::MissingField("number"))?
            .to_string();
        Ok(Breakpoint {
            number,
            breakpoint_type: tuple.get_string("type").unwrap_or_default().to_string(),
            disposition: tuple.get_string("disp").unwrap_or_default().to_string(),
            enabled: tuple.get_string("enabled").map(|s| s == "y").unwrap_or(true),
            addr: tuple.get_string("addr").map(str::to_string),
            func: tuple.get_string("func").map(str::to_string),
            file: tuple.get_string("file").map(str::to_string),
            fullname: tuple.get_string("fullname").map(str::to_string),
            line: tuple.get_string("line").and_then(|s| s.parse().ok()),
            thread_groups: tuple
                .get("thread-groups")
                .and_then(MiValue::as_list)
                .map(|l| {
                    l.values()
                        .filter_map(MiValue::as_const)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            times: tuple
                .get_string("times")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            condition: tuple.get_string("cond").map(str::to_string),
            ignore_count: tuple.get_string("ignore").and_then(|s| s.parse().ok()),
            original_location: tuple.get_string("original-location").map(str::to_string),
        })
    }
}

/// The single breakpoint of a `-break-insert` answer.
pub fn breakpoint(record: &ResultRecord) -> Result<Breakpoint, MiError> {
    let tuple = record
        .find("bkpt")
        .ok_or(MiError::MissingField("bkpt"))?
        .as_tuple()
        .ok_or(MiError::InvalidField("bkpt", "expected a tuple"))?;
    Breakpoint::from_tuple(tuple)
}

/// All breakpoints of a `-break-list` answer. The table body lists
/// `bkpt={...}` entries; bare tuples are accepted as well.
pub fn breakpoint_table(record: &ResultRecord) -> Result<Vec<Breakpoint>, MiError> {
    let table = record
        .find("BreakpointTable")
        .ok_or(MiError::MissingField("BreakpointTable"))?
        .as_tuple()
        .ok_or(MiError::InvalidField("BreakpointTable", "expected a tuple"))?;
    let body = table
        .get("body")
        .ok_or(MiError::MissingField("body"))?
        .as_list()
        .ok_or(MiError::InvalidField("body", "expected a list"))?;
    let mut breakpoints = Vec::with_capacity(body.len());
    for entry in body.values() {
        if let Some(tuple) = entry.as_tuple() {
            breakpoints.push(Breakpoint::from_tuple(tuple)?);
        }
    }
    Ok(breakpoints)
}

/// A watchpoint acknowledged by `-break-watch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchpoint {
    pub number: String,
    pub expression: String,
}

pub fn watchpoint(record: &ResultRecord) -> Result<Watchpoint, MiError> {
    let tuple = record
        .find("wpt")
        .or_else(|| record.find("hw-rwpt"))
        .or_else(|| record.find("hw-awpt"))
        .ok_or(MiError::MissingField("wpt"))?
        .as_tuple()
        .ok_or(MiError::InvalidField("wpt", "expected a tuple"))?;
    Ok(Watchpoint {
        number: tuple
            .get_string("number")
            .ok_or(MiError::MissingField("number"))?
            .to_string(),
        expression: tuple.get_string("exp").unwrap_or_default().to_string(),
    })
}

/// One function argument in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameArg {
    pub name: String,
    pub value: String,
}

/// Stack frame information. `level` is absent in the frame attached to a
/// stopped event and present in stack listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub level: Option<u32>,
    pub addr: String,
    pub func: Option<String>,
    pub args: Vec<FrameArg>,
    pub file: Option<String>,
    pub fullname: Option<String>,
    pub line: Option<u32>,
    pub arch: Option<String>,
}

impl Frame {
    pub fn from_tuple(tuple: &MiTuple) -> Result<Self, MiError> {
        Ok(Frame {
            level: tuple.get_string("level").and_then(|s| s.parse().ok()),
            addr: tuple.get_string("addr").unwrap_or_default().to_string(),
            func: tuple.get_string("func").map(str::to_string),
            args: tuple
                .get("args")
                .and_then(MiValue::as_list)
                .map(|l| {
                    l.values()
                        .filter_map(MiValue::as_tuple)
                        .filter_map(|t| {
                            Some(FrameArg {
                                name: t.get_string("name")?.to_string(),
                                value: t.get_string("value").unwrap_or_default().to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
            file: tuple.get_string("file").map(str::to_string),
            fullname: tuple.get_string("fullname").map(str::to_string),
            line: tuple.get_string("line").and_then(|s| s.parse().ok()),
            arch: tuple.get_string("arch").map(str::to_string),
        })
    }
}

/// Frames of a `-stack-list-frames` answer.
pub fn stack_frames(record: &ResultRecord) -> Result<Vec<Frame>, MiError> {
    let stack = record
        .find("stack")
        .ok_or(MiError::MissingField("stack"))?
        .as_list()
        .ok_or(MiError::InvalidField("stack", "expected a list"))?;
    stack
        .values()
        .filter_map(MiValue::as_tuple)
        .map(Frame::from_tuple)
        .collect()
}

/// The `depth` of a `-stack-info-depth` answer.
pub fn stack_depth(record: &ResultRecord) -> Result<u32, MiError> {
    record
        .find_string("depth")
        .ok_or(MiError::MissingField("depth"))?
        .parse()
        .map_err(|_| MiError::InvalidField("depth", "expected an integer"))
}

/// Thread information from `-thread-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub target_id: String,
    pub name: Option<String>,
    pub state: String,
    pub core: Option<u32>,
    pub frame: Option<Frame>,
}

impl Thread {
    pub fn from_tuple(tuple: &MiTuple) -> Result<Self, MiError> {
        Ok(Thread {
            id: tuple
                .get_string("id")
                .ok_or(MiError::MissingField("id"))?
                .to_string(),
            target_id: tuple.get_string("target-id").unwrap_or_default().to_string(),
            name: tuple.get_string("name").map(str::to_string),
            state: tuple.get_string("state").unwrap_or_default().to_string(),
            core: tuple.get_string("core").and_then(|s| s.parse().ok()),
            frame: tuple
                .get("frame")
                .and_then(MiValue::as_tuple)
                .and_then(|t| Frame::from_tuple(t).ok()),
        })
    }
}

pub fn thread_info(record: &ResultRecord) -> Result<Vec<Thread>, MiError> {
    let threads = record
        .find("threads")
        .ok_or(MiError::MissingField("threads"))?
        .as_list()
        .ok_or(MiError::InvalidField("threads", "expected a list"))?;
    threads
        .values()
        .filter_map(MiValue::as_tuple)
        .map(Thread::from_tuple)
        .collect()
}

/// Ids of a `-thread-list-ids` answer. GDB repeats the `thread-id` name
/// inside one tuple, which is why the tuple type is order-preserving.
pub fn thread_ids(record: &ResultRecord) -> Result<Vec<String>, MiError> {
    let ids = record
        .find("thread-ids")
        .ok_or(MiError::MissingField("thread-ids"))?
        .as_tuple()
        .ok_or(MiError::InvalidField("thread-ids", "expected a tuple"))?;
    Ok(ids
        .iter()
        .filter(|r| r.variable == "thread-id")
        .filter_map(|r| r.value.as_const())
        .map(str::to_string)
        .collect())
}

/// A local variable or function argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: Option<String>,
    pub var_type: Option<String>,
}

impl Variable {
    pub fn from_tuple(tuple: &MiTuple) -> Result<Self, MiError> {
        Ok(Variable {
            name: tuple
                .get_string("name")
                .ok_or(MiError::MissingField("name"))?
                .to_string(),
            value: tuple.get_string("value").map(str::to_string),
            var_type: tuple.get_string("type").map(str::to_string),
        })
    }
}

/// Variables of a `-stack-list-variables` (or `-stack-list-locals`) answer.
pub fn variables(record: &ResultRecord) -> Result<Vec<Variable>, MiError> {
    let list = record
        .find("variables")
        .or_else(|| record.find("locals"))
        .ok_or(MiError::MissingField("variables"))?
        .as_list()
        .ok_or(MiError::InvalidField("variables", "expected a list"))?;
    list.values()
        .filter_map(MiValue::as_tuple)
        .map(Variable::from_tuple)
        .collect()
}

/// The created variable object of a `-var-create` answer.
pub fn created_variable(record: &ResultRecord) -> Result<Variable, MiError> {
    Ok(Variable {
        name: record
            .find_string("name")
            .ok_or(MiError::MissingField("name"))?
            .to_string(),
        value: record.find_string("value").map(str::to_string),
        var_type: record.find_string("type").map(str::to_string),
    })
}

/// Children of a `-var-list-children` answer.
pub fn variable_children(record: &ResultRecord) -> Result<Vec<Variable>, MiError> {
    let children = record
        .find("children")
        .ok_or(MiError::MissingField("children"))?
        .as_list()
        .ok_or(MiError::InvalidField("children", "expected a list"))?;
    children
        .values()
        .filter_map(MiValue::as_tuple)
        .map(Variable::from_tuple)
        .collect()
}

/// The `value` of a `-data-evaluate-expression` answer.
pub fn evaluated_expression(record: &ResultRecord) -> Result<String, MiError> {
    record
        .find_string("value")
        .map(str::to_string)
        .ok_or(MiError::MissingField("value"))
}

/// Names of a `-data-list-register-names` answer, in register order.
pub fn register_names(record: &ResultRecord) -> Result<Vec<String>, MiError> {
    let names = record
        .find("register-names")
        .ok_or(MiError::MissingField("register-names"))?
        .as_list()
        .ok_or(MiError::InvalidField("register-names", "expected a list"))?;
    Ok(names
        .values()
        .filter_map(MiValue::as_const)
        .map(str::to_string)
        .collect())
}

/// One register value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Register {
    pub number: u32,
    pub value: String,
}

pub fn register_values(record: &ResultRecord) -> Result<Vec<Register>, MiError> {
    let values = record
        .find("register-values")
        .ok_or(MiError::MissingField("register-values"))?
        .as_list()
        .ok_or(MiError::InvalidField("register-values", "expected a list"))?;
    Ok(values
        .values()
        .filter_map(MiValue::as_tuple)
        .filter_map(|t| {
            Some(Register {
                number: t.get_string("number")?.parse().ok()?,
                value: t.get_string("value")?.to_string(),
            })
        })
        .collect())
}

/// One contiguous block of a `-data-read-memory-bytes` answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub begin: String,
    pub end: String,
    pub offset: Option<String>,
    /// Hex-encoded, two digits per byte.
    pub contents: String,
}

impl MemoryBlock {
    /// The block contents as raw bytes.
    pub fn data(&self) -> Result<Vec<u8>, MiError> {
        let digits = self.contents.as_bytes();
        if digits.len() % 2 != 0 {
            return Err(MiError::InvalidField("contents", "odd hex digit count"));
        }
        digits
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16);
                let lo = (pair[1] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok((hi * 16 + lo) as u8),
                    _ => Err(MiError::InvalidField("contents", "not a hex digit")),
                }
            })
            .collect()
    }
}

pub fn memory_bytes(record: &ResultRecord) -> Result<Vec<MemoryBlock>, MiError> {
    let memory = record
        .find("memory")
        .ok_or(MiError::MissingField("memory"))?
        .as_list()
        .ok_or(MiError::InvalidField("memory", "expected a list"))?;
    memory
        .values()
        .filter_map(MiValue::as_tuple)
        .map(|t| {
            Ok(MemoryBlock {
                begin: t
                    .get_string("begin")
                    .ok_or(MiError::MissingField("begin"))?
                    .to_string(),
                end: t.get_string("end").unwrap_or_default().to_string(),
                offset: t.get_string("offset").map(str::to_string),
                contents: t
                    .get_string("contents")
                    .ok_or(MiError::MissingField("contents"))?
                    .to_string(),
            })
        })
        .collect()
}

/// One disassembled instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: String,
    pub func_name: Option<String>,
    pub offset: Option<u64>,
    pub inst: String,
}

/// Instructions of a `-data-disassemble` answer (plain mode).
pub fn disassembly(record: &ResultRecord) -> Result<Vec<Instruction>, MiError> {
    let insns = record
        .find("asm_insns")
        .ok_or(MiError::MissingField("asm_insns"))?
        .as_list()
        .ok_or(MiError::InvalidField("asm_insns", "expected a list"))?;
    Ok(insns
        .values()
        .filter_map(MiValue::as_tuple)
        .filter_map(|t| {
            Some(Instruction {
                address: t.get_string("address")?.to_string(),
                func_name: t.get_string("func-name").map(str::to_string),
                offset: t.get_string("offset").and_then(|s| s.parse().ok()),
                inst: t.get_string("inst")?.to_string(),
            })
        })
        .collect())
}

/// A `^done` that only acknowledges, with no payload worth decoding.
pub fn acknowledged(record: &ResultRecord) -> Result<(), MiError> {
    debug_assert_ne!(record.class, MiResultClass::Error);
    Ok(())
}
