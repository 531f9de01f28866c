/// GDB/MI output parser
///
/// This module classifies one line of GDB/MI output at a time and parses
/// the value grammar (quoted constants, tuples, lists) into the types of
/// the data model. A failed line never leaves the parser in a bad state;
/// every call starts fresh.

use crate::types::{
    AsyncKind, AsyncRecord, MiList, MiListEntry, MiRecord, MiResult, MiResultClass, MiTuple,
    MiValue, ResultRecord, StreamKind, StreamRecord,
};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized record: {0:?}")]
    UnknownRecord(String),
    #[error("unknown result class: {0:?}")]
    UnknownResultClass(String),
    #[error("unterminated string constant")]
    UnterminatedString,
    #[error("unbalanced `{0}`")]
    Unbalanced(char),
    #[error("empty value at offset {0}")]
    EmptyValue(usize),
    #[error("stream record payload is not a quoted string")]
    BadStreamPayload,
    #[error("trailing characters after record: {0:?}")]
    TrailingGarbage(String),
}

fn result_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d*)\^([a-z-]+)(?:,(.*))?$").unwrap())
}

fn async_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d*)([*+=])([A-Za-z0-9_-]+)(?:,(.*))?$").unwrap())
}

/// Parse a single line of GDB/MI output.
pub fn parse_mi_line(line: &str) -> Result<MiRecord, ParseError> {
    let line = line.trim();

    if line == "(gdb)" {
        return Ok(MiRecord::Prompt);
    }
    if line.is_empty() {
        return Err(ParseError::UnknownRecord(String::new()));
    }

    // Stream records carry a single C-escaped string, no fields. A
    // leading token run is tolerated and ignored; GDB does not echo
    // tokens on stream output.
    let class_start = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    let stream_kind = match line[class_start..].chars().next() {
        Some('~') => Some(StreamKind::Console),
        Some('@') => Some(StreamKind::Target),
        Some('&') => Some(StreamKind::Log),
        _ => None,
    };
    if let Some(kind) = stream_kind {
        let mut scanner = Scanner::new(&line[class_start + 1..]);
        if scanner.peek() != Some('"') {
            return Err(ParseError::BadStreamPayload);
        }
        let text = parse_c_string(&mut scanner)?;
        if !scanner.at_end() {
            return Err(ParseError::TrailingGarbage(scanner.rest().to_string()));
        }
        return Ok(MiRecord::Stream(StreamRecord { kind, text }));
    }

    if let Some(caps) = result_header().captures(line) {
        let token = parse_token(caps.get(1).map_or("", |m| m.as_str()));
        let class_str = caps.get(2).map_or("", |m| m.as_str());
        let class = MiResultClass::from_str(class_str)
            .ok_or_else(|| ParseError::UnknownResultClass(class_str.to_string()))?;
        let results = match caps.get(3) {
            Some(m) => parse_field_list(m.as_str())?,
            None => Vec::new(),
        };
        return Ok(MiRecord::Result(ResultRecord {
            token,
            class,
            results,
        }));
    }

    if let Some(caps) = async_header().captures(line) {
        let token = parse_token(caps.get(1).map_or("", |m| m.as_str()));
        let kind = match caps.get(2).map_or("", |m| m.as_str()) {
            "*" => AsyncKind::Exec,
            "+" => AsyncKind::Status,
            _ => AsyncKind::Notify,
        };
        let class = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let results = match caps.get(4) {
            Some(m) => parse_field_list(m.as_str())?,
            None => Vec::new(),
        };
        return Ok(MiRecord::Async(AsyncRecord {
            token,
            kind,
            class,
            results,
        }));
    }

    Err(ParseError::UnknownRecord(line.to_string()))
}

fn parse_token(digits: &str) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse the comma-separated field list that follows a record class.
pub fn parse_field_list(input: &str) -> Result<Vec<MiResult>, ParseError> {
    let mut scanner = Scanner::new(input);
    let mut results = Vec::new();

    if scanner.at_end() {
        return Ok(results);
    }
    loop {
        results.push(parse_entry(&mut scanner)?);
        if scanner.eat(',') {
            continue;
        }
        if scanner.at_end() {
            break;
        }
        return Err(ParseError::TrailingGarbage(scanner.rest().to_string()));
    }
    Ok(results)
}

/// Cursor over a record payload. Positions are byte offsets into the
/// original slice so quoted UTF-8 content is handled correctly.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Scan an identifier (field name) without consuming it.
    fn identifier_end(&self) -> usize {
        let mut end = self.pos;
        for c in self.src[self.pos..].chars() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }
}

/// Parse `variable=value`, or a bare value where GDB omits the name.
fn parse_entry(scanner: &mut Scanner<'_>) -> Result<MiResult, ParseError> {
    let ident_end = scanner.identifier_end();
    if ident_end > scanner.pos && scanner.src[ident_end..].starts_with('=') {
        let variable = scanner.src[scanner.pos..ident_end].to_string();
        scanner.pos = ident_end + 1;
        let value = parse_value(scanner)?;
        return Ok(MiResult { variable, value });
    }
    let value = parse_value(scanner)?;
    Ok(MiResult {
        variable: String::new(),
        value,
    })
}

fn parse_value(scanner: &mut Scanner<'_>) -> Result<MiValue, ParseError> {
    match scanner.peek() {
        Some('"') => Ok(MiValue::Const(parse_c_string(scanner)?)),
        Some('{') => parse_tuple(scanner),
        Some('[') => parse_list(scanner),
        _ => parse_bare_const(scanner),
    }
}

fn parse_tuple(scanner: &mut Scanner<'_>) -> Result<MiValue, ParseError> {
    scanner.bump(); // consume '{'
    let mut entries = Vec::new();
    if scanner.eat('}') {
        return Ok(MiValue::Tuple(MiTuple(entries)));
    }
    loop {
        entries.push(parse_entry(scanner)?);
        if scanner.eat(',') {
            continue;
        }
        if scanner.eat('}') {
            return Ok(MiValue::Tuple(MiTuple(entries)));
        }
        return Err(ParseError::Unbalanced('{'));
    }
}

fn parse_list(scanner: &mut Scanner<'_>) -> Result<MiValue, ParseError> {
    scanner.bump(); // consume '['
    let mut entries = Vec::new();
    if scanner.eat(']') {
        return Ok(MiValue::List(MiList(entries)));
    }
    loop {
        // A list element is a named pair or a bare value; peek for `ident=`.
        let ident_end = scanner.identifier_end();
        if ident_end > scanner.pos && scanner.src[ident_end..].starts_with('=') {
            let variable = scanner.src[scanner.pos..ident_end].to_string();
            scanner.pos = ident_end + 1;
            let value = parse_value(scanner)?;
            entries.push(MiListEntry::Result(MiResult { variable, value }));
        } else {
            entries.push(MiListEntry::Value(parse_value(scanner)?));
        }
        if scanner.eat(',') {
            continue;
        }
        if scanner.eat(']') {
            return Ok(MiValue::List(MiList(entries)));
        }
        return Err(ParseError::Unbalanced('['));
    }
}

/// An unquoted word, read up to the next structural delimiter.
fn parse_bare_const(scanner: &mut Scanner<'_>) -> Result<MiValue, ParseError> {
    let start = scanner.pos;
    while let Some(c) = scanner.peek() {
        if c == ',' || c == ']' || c == '}' {
            break;
        }
        scanner.bump();
    }
    if scanner.pos == start {
        return Err(ParseError::EmptyValue(start));
    }
    Ok(MiValue::Const(scanner.src[start..scanner.pos].to_string()))
}

/// Decode a double-quoted C string: `\n`, `\t`, `\r`, `\\`, `\"`, `\'`
/// and octal escapes. Unknown escapes are kept verbatim.
fn parse_c_string(scanner: &mut Scanner<'_>) -> Result<String, ParseError> {
    scanner.bump(); // consume opening quote
    let mut out = String::new();
    loop {
        let c = scanner.bump().ok_or(ParseError::UnterminatedString)?;
        match c {
            '"' => return Ok(out),
            '\\' => {
                let esc = scanner.bump().ok_or(ParseError::UnterminatedString)?;
                match esc {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '\'' => out.push('\''),
                    '0'..='7' => {
                        let mut value = esc as u32 - '0' as u32;
                        for _ in 0..2 {
                            match scanner.peek() {
                                Some(d @ '0'..='7') => {
                                    value = value * 8 + (d as u32 - '0' as u32);
                                    scanner.bump();
                                }
                                _ => break,
                            }
                        }
                        out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_result_record(line: &str) -> ResultRecord {
        match parse_mi_line(line).unwrap() {
            MiRecord::Result(r) => r,
            other => panic!("expected result record, got {:?}", other),
        }
    }

    fn parse_async_record(line: &str) -> AsyncRecord {
        match parse_mi_line(line).unwrap() {
            MiRecord::Async(r) => r,
            other => panic!("expected async record, got {:?}", other),
        }
    }

    #[test]
    fn bare_done() {
        let record = parse_result_record("^done");
        assert_eq!(record.class, MiResultClass::Done);
        assert_eq!(record.token, None);
        assert!(record.results.is_empty());
    }

    #[test]
    fn breakpoint_result_with_token() {
        let record =
            parse_result_record(r#"1^done,bkpt={number="1",type="breakpoint",disp="keep"}"#);
        assert_eq!(record.token, Some(1));
        assert_eq!(record.class, MiResultClass::Done);
        let bkpt = record.find("bkpt").unwrap().as_tuple().unwrap();
        assert_eq!(bkpt.get_string("number"), Some("1"));
        assert_eq!(bkpt.get_string("type"), Some("breakpoint"));
        assert_eq!(bkpt.get_string("disp"), Some("keep"));
    }

    #[test]
    fn error_message_is_escape_decoded() {
        let record =
            parse_result_record(r#"^error,msg="No symbol \"foo\" in current context.""#);
        assert_eq!(record.class, MiResultClass::Error);
        assert_eq!(
            record.find_string("msg"),
            Some("No symbol \"foo\" in current context.")
        );
    }

    #[test]
    fn exec_async_stopped() {
        let record = parse_async_record(r#"*stopped,reason="breakpoint-hit",thread-id="1""#);
        assert_eq!(record.kind, AsyncKind::Exec);
        assert_eq!(record.class, "stopped");
        assert_eq!(record.find_string("reason"), Some("breakpoint-hit"));
    }

    #[test]
    fn status_async_record() {
        let record = parse_async_record(r#"+download,{section=".text",section-size="6668"}"#);
        assert_eq!(record.kind, AsyncKind::Status);
        assert_eq!(record.class, "download");
        // The payload is a bare tuple without a field name.
        assert_eq!(record.results.len(), 1);
        assert!(record.results[0].variable.is_empty());
    }

    #[test]
    fn notify_async_record() {
        let record = parse_async_record(r#"=thread-group-started,id="i1",pid="28655""#);
        assert_eq!(record.kind, AsyncKind::Notify);
        assert_eq!(record.class, "thread-group-started");
        assert_eq!(record.find_string("id"), Some("i1"));
        assert_eq!(record.find_string("pid"), Some("28655"));
    }

    #[test]
    fn async_record_with_token() {
        let record = parse_async_record(r#"42*running,thread-id="all""#);
        assert_eq!(record.token, Some(42));
    }

    #[test]
    fn stream_records() {
        for (line, kind, text) in [
            ("~\"Hello, World!\\n\"", StreamKind::Console, "Hello, World!\n"),
            ("@\"target output\"", StreamKind::Target, "target output"),
            ("&\"warning: bad\\n\"", StreamKind::Log, "warning: bad\n"),
        ] {
            match parse_mi_line(line).unwrap() {
                MiRecord::Stream(s) => {
                    assert_eq!(s.kind, kind);
                    assert_eq!(s.text, text);
                }
                other => panic!("expected stream record, got {:?}", other),
            }
        }
    }

    #[test]
    fn prompt_line() {
        assert_eq!(parse_mi_line("(gdb)").unwrap(), MiRecord::Prompt);
        assert_eq!(parse_mi_line("(gdb) ").unwrap(), MiRecord::Prompt);
    }

    #[test]
    fn octal_escapes_are_decoded() {
        let record = parse_result_record(r#"^done,value="a\040b\007""#);
        assert_eq!(record.find_string("value"), Some("a b\u{7}"));
    }

    #[test]
    fn commas_inside_quoted_strings_are_content() {
        let record = parse_result_record(r#"^done,msg="one, two, three",extra="x""#);
        assert_eq!(record.find_string("msg"), Some("one, two, three"));
        assert_eq!(record.find_string("extra"), Some("x"));
    }

    #[test]
    fn empty_tuple_and_list() {
        let record = parse_result_record(r#"^done,a={},b=[]"#);
        assert!(record.find("a").unwrap().as_tuple().unwrap().is_empty());
        assert!(record.find("b").unwrap().as_list().unwrap().is_empty());
    }

    #[test]
    fn list_of_bare_values() {
        let record = parse_result_record(r#"^done,register-names=["eax","ebx","ecx"]"#);
        let names: Vec<_> = record
            .find("register-names")
            .unwrap()
            .as_list()
            .unwrap()
            .values()
            .filter_map(MiValue::as_const)
            .collect();
        assert_eq!(names, vec!["eax", "ebx", "ecx"]);
    }

    #[test]
    fn list_of_named_pairs() {
        let record = parse_result_record(
            r#"^done,asm_insns=[src_and_asm_line={line="31"},src_and_asm_line={line="32"}]"#,
        );
        let list = record.find("asm_insns").unwrap().as_list().unwrap();
        assert_eq!(list.len(), 2);
        for entry in list.iter() {
            match entry {
                MiListEntry::Result(r) => assert_eq!(r.variable, "src_and_asm_line"),
                other => panic!("expected named entry, got {:?}", other),
            }
        }
    }

    #[test]
    fn deeply_nested_values() {
        let record = parse_result_record(
            r#"^done,stack=[frame={level="0",args=[{name="argc",value="1"},{name="argv",value="0xbf4d"}]}]"#,
        );
        let stack = record.find("stack").unwrap().as_list().unwrap();
        let frame = stack.values().next().unwrap().as_tuple().unwrap();
        let args = frame.get("args").unwrap().as_list().unwrap();
        let argc = args.values().next().unwrap().as_tuple().unwrap();
        assert_eq!(argc.get_string("name"), Some("argc"));
    }

    #[test]
    fn duplicate_tuple_names_are_preserved_in_order() {
        let record =
            parse_result_record(r#"^done,thread-ids={thread-id="2",thread-id="1"}"#);
        let ids = record.find("thread-ids").unwrap().as_tuple().unwrap();
        let collected: Vec<_> = ids
            .iter()
            .map(|r| (r.variable.as_str(), r.value.as_const().unwrap()))
            .collect();
        assert_eq!(collected, vec![("thread-id", "2"), ("thread-id", "1")]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            parse_mi_line(r#"^done,msg="oops"#),
            Err(ParseError::UnterminatedString)
        );
    }

    #[test]
    fn unbalanced_tuple_is_an_error() {
        assert_eq!(
            parse_mi_line(r#"^done,bkpt={number="1""#),
            Err(ParseError::Unbalanced('{'))
        );
    }

    #[test]
    fn unknown_result_class_is_an_error() {
        assert_eq!(
            parse_mi_line("^finished"),
            Err(ParseError::UnknownResultClass("finished".into()))
        );
    }

    #[test]
    fn garbage_line_is_an_error() {
        assert!(matches!(
            parse_mi_line("Reading symbols from /bin/true..."),
            Err(ParseError::UnknownRecord(_))
        ));
    }

    #[test]
    fn bad_line_does_not_poison_the_next_one() {
        assert!(parse_mi_line(r#"^done,msg="oops"#).is_err());
        assert!(parse_mi_line("^done").is_ok());
    }

    #[test]
    fn reserialized_tree_parses_to_the_same_tree() {
        // Nested list/tuple mix, ten levels deep.
        let mut line = String::from(r#"^done,a="leaf""#);
        for _ in 0..10 {
            line = line.replacen("a=", "a={inner=[b=", 1).replacen("\"leaf\"", "\"leaf\"]}", 1);
        }
        let record = parse_result_record(&line);
        let reserialized: String = record
            .results
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let reparsed = parse_field_list(&reserialized).unwrap();
        assert_eq!(reparsed, record.results);
    }

    #[test]
    fn bare_word_values_at_record_level() {
        let record = parse_result_record("^done,unlimited");
        assert_eq!(record.results.len(), 1);
        assert_eq!(record.results[0].value.as_const(), Some("unlimited"));
    }
}
