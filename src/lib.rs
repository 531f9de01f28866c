/// GDB/MI protocol codec
///
/// This crate speaks GDB's Machine Interface: it renders typed commands
/// into the textual wire format (quoting, option/parameter ordering,
/// thread/frame qualifiers), parses the asynchronous token-correlated
/// response stream back into structured records, and matches each result
/// record to the command that caused it.
///
/// The codec itself is synchronous and does no I/O. `session` adds a
/// small tokio driver for callers that have a transport to the debugger
/// process; owning that process is out of scope.

use thiserror::Error;

pub mod builders;
pub mod command;
pub mod correlation;
pub mod events;
pub mod output;
pub mod parser;
pub mod session;
pub mod types;

pub use command::{Adjustable, EncodeError, MiCommand};
pub use correlation::{CommandTracker, SentCommand};
pub use events::{AsyncClass, MiEvent, StopReason, StoppedEvent};
pub use parser::{parse_mi_line, ParseError};
pub use session::MiSession;
pub use types::{
    AsyncKind, AsyncRecord, MiList, MiListEntry, MiRecord, MiResult, MiResultClass, MiTuple,
    MiValue, ResultRecord, StreamKind, StreamRecord,
};

#[derive(Error, Debug)]
pub enum MiError {
    #[error("failed to encode command: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to parse MI output: {0}")]
    Parse(#[from] ParseError),
    /// A syntactically valid `^error` answer; the message is GDB's own.
    #[error("debugger reported an error: {0}")]
    CommandFailed(String),
    #[error("missing field `{0}` in result record")]
    MissingField(&'static str),
    #[error("field `{0}`: {1}")]
    InvalidField(&'static str, &'static str),
    #[error("connection is shut down")]
    ConnectionClosed,
    #[error("failed to write to transport: {0}")]
    Write(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_is_consistent() {
        let cmd = builders::break_insert_temporary("main");
        assert_eq!(cmd.encode().unwrap(), "-break-insert -t main\n");

        let record = parse_mi_line(r#"1^done,bkpt={number="1",type="breakpoint",disp="keep"}"#)
            .unwrap();
        match record {
            MiRecord::Result(r) => {
                assert_eq!(r.token, Some(1));
                assert_eq!(r.class, MiResultClass::Done);
                let bp = output::breakpoint(&r).unwrap();
                assert_eq!(bp.number, "1");
            }
            other => panic!("expected result record, got {:?}", other),
        }
    }

    #[test]
    fn value_trees_serialize_to_json() {
        let record = match parse_mi_line(r#"^done,bkpt={number="1",thread-groups=["i1"]}"#).unwrap()
        {
            MiRecord::Result(r) => r,
            other => panic!("expected result record, got {:?}", other),
        };
        let json = serde_json::to_value(record.find("bkpt").unwrap()).unwrap();
        assert_eq!(
            json["Tuple"][0]["variable"],
            serde_json::Value::String("number".into())
        );
    }

    #[test]
    fn error_types_convert_into_the_crate_error() {
        fn encode(cmd: &MiCommand) -> Result<String> {
            Ok(cmd.encode()?)
        }
        let conflicted = MiCommand::mi("-exec-run")
            .allow_thread_group()
            .thread("1")
            .thread_group("i1");
        assert!(matches!(encode(&conflicted), Err(MiError::Encode(_))));

        fn parse(line: &str) -> Result<MiRecord> {
            Ok(parse_mi_line(line)?)
        }
        assert!(matches!(parse("^done,msg=\"x"), Err(MiError::Parse(_))));
    }
}
