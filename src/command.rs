/// Command construction and wire-format encoding
///
/// A command is one parametric value: an operation, ordered options and
/// parameters, and optional thread/frame/thread-group qualifiers. How a
/// value is escaped before it lands on the command line is decided by the
/// per-parameter `Adjustable` strategy, never by the encoder itself.

use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("`{0}` cannot take both --thread and --thread-group")]
    ConflictingQualifiers(String),
}

/// Escaping policy for one option or parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustable {
    /// Escapes `"` and `\`, quotes the result when it contains whitespace.
    StandardParameter(String),
    /// Same escaping as a parameter, always rendered with a leading space.
    StandardOption(String),
    /// Passthrough for values GDB must receive byte-for-byte, e.g. a
    /// breakpoint condition or a search path that must not be quoted.
    NoChange(String),
}

impl Adjustable {
    pub fn parameter(value: impl Into<String>) -> Self {
        Adjustable::StandardParameter(value.into())
    }

    pub fn option(value: impl Into<String>) -> Self {
        Adjustable::StandardOption(value.into())
    }

    pub fn no_change(value: impl Into<String>) -> Self {
        Adjustable::NoChange(value.into())
    }

    /// The raw value, unmodified.
    pub fn value(&self) -> &str {
        match self {
            Adjustable::StandardParameter(v)
            | Adjustable::StandardOption(v)
            | Adjustable::NoChange(v) => v,
        }
    }

    /// The value as it goes on the command line.
    pub fn adjusted_value(&self) -> String {
        match self {
            Adjustable::StandardParameter(v) => quote_for_wire(v),
            Adjustable::StandardOption(v) => format!(" {}", quote_for_wire(v)),
            Adjustable::NoChange(v) => v.clone(),
        }
    }
}

/// Backslash-escape `"` and `\`, then quote the whole value if the escaped
/// text contains a space or tab. An empty value stays empty; it is not
/// turned into `""` (historical behavior GDB front ends rely on).
fn quote_for_wire(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    if escaped.contains(' ') || escaped.contains('\t') {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

/// A request to send to the debugger.
///
/// Created per invocation; the option/parameter lists can only be replaced
/// wholesale after construction. Rendering happens in `encode`.
#[derive(Debug, Clone)]
pub struct MiCommand {
    operation: String,
    options: Vec<Adjustable>,
    parameters: Vec<Adjustable>,
    thread_id: Option<String>,
    frame: Option<u32>,
    thread_group: Option<String>,
    supports_thread_and_frame: bool,
    supports_thread_group: bool,
    raw: bool,
}

impl MiCommand {
    /// A regular MI command. Thread/frame qualifiers are accepted unless
    /// switched off; a thread-group qualifier must be opted into.
    pub fn mi(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            options: Vec::new(),
            parameters: Vec::new(),
            thread_id: None,
            frame: None,
            thread_group: None,
            supports_thread_and_frame: true,
            supports_thread_group: false,
            raw: false,
        }
    }

    /// A raw CLI command, passed to GDB verbatim. Raw commands take no
    /// qualifiers and are sent without a token (GDB would read the token
    /// as part of the command text).
    pub fn cli(text: impl Into<String>) -> Self {
        Self {
            operation: text.into(),
            options: Vec::new(),
            parameters: Vec::new(),
            thread_id: None,
            frame: None,
            thread_group: None,
            supports_thread_and_frame: false,
            supports_thread_group: false,
            raw: true,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn options(&self) -> &[Adjustable] {
        &self.options
    }

    pub fn parameters(&self) -> &[Adjustable] {
        &self.parameters
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn option(mut self, value: impl Into<String>) -> Self {
        self.options.push(Adjustable::StandardOption(value.into()));
        self
    }

    pub fn param(mut self, value: impl Into<String>) -> Self {
        self.parameters
            .push(Adjustable::StandardParameter(value.into()));
        self
    }

    /// A parameter the encoder must not touch.
    pub fn param_no_change(mut self, value: impl Into<String>) -> Self {
        self.parameters.push(Adjustable::NoChange(value.into()));
        self
    }

    pub fn with_option(mut self, option: Adjustable) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_parameter(mut self, parameter: Adjustable) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn thread(mut self, id: impl Into<String>) -> Self {
        self.thread_id = Some(id.into());
        self
    }

    pub fn frame(mut self, level: u32) -> Self {
        self.frame = Some(level);
        self
    }

    pub fn thread_group(mut self, id: impl Into<String>) -> Self {
        self.thread_group = Some(id.into());
        self
    }

    /// Commands that change the selection themselves (`-thread-select`,
    /// `-stack-select-frame`) must not carry `--thread`/`--frame`.
    pub fn forbid_thread_and_frame(mut self) -> Self {
        self.supports_thread_and_frame = false;
        self
    }

    pub fn allow_thread_group(mut self) -> Self {
        self.supports_thread_group = true;
        self
    }

    /// Replace the option list wholesale.
    pub fn set_options(&mut self, options: Vec<Adjustable>) {
        self.options = options;
    }

    /// Replace the parameter list wholesale.
    pub fn set_parameters(&mut self, parameters: Vec<Adjustable>) {
        self.parameters = parameters;
    }

    /// Render the command to one newline-terminated wire line, without a
    /// token. The emission order is fixed; GDB's option parser is
    /// order-sensitive.
    pub fn encode(&self) -> Result<String, EncodeError> {
        if self.raw {
            let mut line = self.operation.clone();
            line.push('\n');
            return Ok(line);
        }

        let thread = self
            .supports_thread_and_frame
            .then_some(self.thread_id.as_deref())
            .flatten()
            .filter(|id| !id.is_empty());
        let group = self
            .supports_thread_group
            .then_some(self.thread_group.as_deref())
            .flatten()
            .filter(|id| !id.is_empty());
        if thread.is_some() && group.is_some() {
            return Err(EncodeError::ConflictingQualifiers(self.operation.clone()));
        }

        let mut line = self.operation.clone();
        if let Some(id) = thread {
            let _ = write!(line, " --thread {}", id);
            if let Some(level) = self.frame {
                let _ = write!(line, " --frame {}", level);
            }
        } else if let Some(id) = group {
            let _ = write!(line, " --thread-group {}", id);
        }

        for option in &self.options {
            let adjusted = option.adjusted_value();
            line.push(' ');
            line.push_str(adjusted.trim());
        }

        // GDB would misread a parameter starting with `-` as a flag.
        if !self.options.is_empty()
            && self
                .parameters
                .iter()
                .any(|p| p.value().starts_with('-'))
        {
            line.push_str(" --");
        }

        for parameter in &self.parameters {
            let adjusted = parameter.adjusted_value();
            line.push(' ');
            line.push_str(adjusted.trim());
        }

        line.push('\n');
        Ok(line)
    }
}

/// Two commands are the same request if they target the same context and
/// render to the same wire line. Used to spot duplicate in-flight sends.
impl PartialEq for MiCommand {
    fn eq(&self, other: &Self) -> bool {
        self.thread_id == other.thread_id
            && self.frame == other.frame
            && self.thread_group == other.thread_group
            && self.encode().ok() == other.encode().ok()
    }
}

impl Eq for MiCommand {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_insert_with_option() {
        let cmd = MiCommand::mi("-break-insert").option("-t").param("main");
        assert_eq!(cmd.encode().unwrap(), "-break-insert -t main\n");
    }

    #[test]
    fn condition_parameter_goes_unescaped() {
        let cmd = MiCommand::mi("-break-condition")
            .param("1")
            .param_no_change("x > 5");
        assert_eq!(cmd.encode().unwrap(), "-break-condition 1 x > 5\n");
    }

    #[test]
    fn whitespace_parameter_is_quoted() {
        let cmd = MiCommand::mi("-file-exec-and-symbols").param("/tmp/my prog");
        assert_eq!(
            cmd.encode().unwrap(),
            "-file-exec-and-symbols \"/tmp/my prog\"\n"
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        let cmd = MiCommand::mi("-data-evaluate-expression").param(r#"strcmp(s, "a\b")"#);
        assert_eq!(
            cmd.encode().unwrap(),
            "-data-evaluate-expression \"strcmp(s, \\\"a\\\\b\\\")\"\n"
        );
    }

    #[test]
    fn empty_parameter_stays_empty() {
        let cmd = MiCommand::mi("-gdb-set").param("args").param("");
        assert_eq!(cmd.encode().unwrap(), "-gdb-set args \n");
    }

    #[test]
    fn thread_and_frame_qualifiers() {
        let cmd = MiCommand::mi("-stack-list-frames").thread("2").frame(3);
        assert_eq!(
            cmd.encode().unwrap(),
            "-stack-list-frames --thread 2 --frame 3\n"
        );
    }

    #[test]
    fn frame_without_thread_is_not_emitted() {
        let cmd = MiCommand::mi("-stack-list-frames").frame(3);
        assert_eq!(cmd.encode().unwrap(), "-stack-list-frames\n");
    }

    #[test]
    fn thread_qualifier_dropped_when_unsupported() {
        let cmd = MiCommand::mi("-thread-select")
            .forbid_thread_and_frame()
            .thread("2")
            .param("2");
        assert_eq!(cmd.encode().unwrap(), "-thread-select 2\n");
    }

    #[test]
    fn thread_group_qualifier() {
        let cmd = MiCommand::mi("-target-attach")
            .forbid_thread_and_frame()
            .allow_thread_group()
            .thread_group("i1");
        assert_eq!(cmd.encode().unwrap(), "-target-attach --thread-group i1\n");
    }

    #[test]
    fn conflicting_qualifiers_are_rejected() {
        // Only one of the two qualifiers may be rendered.
        let cmd = MiCommand::mi("-exec-run")
            .allow_thread_group()
            .thread("1")
            .thread_group("i1");
        assert_eq!(
            cmd.encode(),
            Err(EncodeError::ConflictingQualifiers("-exec-run".into()))
        );
    }

    #[test]
    fn separator_before_dash_parameter() {
        let cmd = MiCommand::mi("-exec-arguments").option("-v").param("-x");
        assert_eq!(cmd.encode().unwrap(), "-exec-arguments -v -- -x\n");
    }

    #[test]
    fn no_separator_without_options() {
        let cmd = MiCommand::mi("-exec-arguments").param("-x");
        assert_eq!(cmd.encode().unwrap(), "-exec-arguments -x\n");
    }

    #[test]
    fn no_separator_without_dash_parameter() {
        let cmd = MiCommand::mi("-break-insert").option("-t").param("main");
        assert!(!cmd.encode().unwrap().contains("--"));
    }

    #[test]
    fn cli_command_is_verbatim() {
        let cmd = MiCommand::cli("info sharedlibrary");
        assert!(cmd.is_raw());
        assert_eq!(cmd.encode().unwrap(), "info sharedlibrary\n");
    }

    #[test]
    fn rendered_line_round_trips_parameter_boundaries() {
        let params = ["plain", "has space", r#"quo"te"#, r#"back\slash"#];
        let mut cmd = MiCommand::mi("-fake-op");
        for p in params {
            cmd = cmd.param(p);
        }
        let line = cmd.encode().unwrap();
        let split = split_on_unescaped_whitespace(line.trim_end());
        assert_eq!(split[0], "-fake-op");
        assert_eq!(&split[1..], &params);
    }

    // Re-splits a rendered line the way GDB's own argument scanner would:
    // whitespace separates, quotes group, backslash escapes.
    fn split_on_unescaped_whitespace(line: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut escaped = false;
        let mut started = false;
        for c in line.chars() {
            if escaped {
                current.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    started = true;
                }
                '"' => {
                    in_quotes = !in_quotes;
                    started = true;
                }
                ' ' | '\t' if !in_quotes => {
                    if started {
                        out.push(std::mem::take(&mut current));
                        started = false;
                    }
                }
                c => {
                    current.push(c);
                    started = true;
                }
            }
        }
        if started {
            out.push(current);
        }
        out
    }

    #[test]
    fn equal_commands_render_identically() {
        let a = MiCommand::mi("-break-insert").option("-t").param("main");
        let b = MiCommand::mi("-break-insert").option("-t").param("main");
        let c = MiCommand::mi("-break-insert").param("main");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, b.clone().thread("1"));
    }

    #[test]
    fn adjusted_value_of_option_is_space_prefixed() {
        let opt = Adjustable::option("--all-values");
        assert_eq!(opt.adjusted_value(), " --all-values");
        assert_eq!(opt.value(), "--all-values");
    }

    #[test]
    fn option_with_tab_is_quoted() {
        let opt = Adjustable::option("a\tb");
        assert_eq!(opt.adjusted_value(), " \"a\tb\"");
    }
}
