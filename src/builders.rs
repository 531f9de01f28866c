/// Command catalog
///
/// One constructor per command family. Behavior differences between
/// commands reduce to the operation string, the qualifier-support flags
/// and the escaping policy of individual values, so each builder is a
/// few lines on top of `MiCommand`.

use crate::command::{Adjustable, MiCommand};

// ---- executable and symbols ----

pub fn file_exec_and_symbols(path: &str) -> MiCommand {
    MiCommand::mi("-file-exec-and-symbols").param(path)
}

pub fn file_exec_file(path: &str) -> MiCommand {
    MiCommand::mi("-file-exec-file").param(path)
}

pub fn file_symbol_file(path: &str) -> MiCommand {
    MiCommand::mi("-file-symbol-file").param(path)
}

// ---- target connection ----

pub fn target_select(kind: &str, parameters: &[&str]) -> MiCommand {
    let mut cmd = MiCommand::mi("-target-select").param(kind);
    for p in parameters {
        cmd = cmd.param(*p);
    }
    cmd
}

pub fn target_select_remote(host_port: &str) -> MiCommand {
    target_select("remote", &[host_port])
}

/// Attach to an inferior. The inferior is addressed with the
/// `--thread-group` qualifier, not a parameter.
pub fn target_attach(thread_group: &str) -> MiCommand {
    MiCommand::mi("-target-attach")
        .forbid_thread_and_frame()
        .allow_thread_group()
        .thread_group(thread_group)
}

pub fn target_detach(thread_group: &str) -> MiCommand {
    MiCommand::mi("-target-detach")
        .forbid_thread_and_frame()
        .allow_thread_group()
        .thread_group(thread_group)
}

pub fn target_download() -> MiCommand {
    MiCommand::mi("-target-download")
}

// ---- execution control ----

pub fn exec_run() -> MiCommand {
    MiCommand::mi("-exec-run")
}

pub fn exec_continue() -> MiCommand {
    MiCommand::mi("-exec-continue")
}

pub fn exec_next() -> MiCommand {
    MiCommand::mi("-exec-next")
}

pub fn exec_next_instruction() -> MiCommand {
    MiCommand::mi("-exec-next-instruction")
}

pub fn exec_step() -> MiCommand {
    MiCommand::mi("-exec-step")
}

pub fn exec_step_instruction() -> MiCommand {
    MiCommand::mi("-exec-step-instruction")
}

pub fn exec_finish() -> MiCommand {
    MiCommand::mi("-exec-finish")
}

pub fn exec_until(location: &str) -> MiCommand {
    MiCommand::mi("-exec-until").param(location)
}

pub fn exec_interrupt() -> MiCommand {
    MiCommand::mi("-exec-interrupt")
}

pub fn exec_jump(location: &str) -> MiCommand {
    MiCommand::mi("-exec-jump").param(location)
}

// ---- breakpoints and watchpoints ----

pub fn break_insert(location: &str) -> MiCommand {
    break_insert_full(false, false, None, None, location)
}

pub fn break_insert_temporary(location: &str) -> MiCommand {
    break_insert_full(true, false, None, None, location)
}

pub fn break_insert_full(
    temporary: bool,
    hardware: bool,
    condition: Option<&str>,
    ignore_count: Option<u32>,
    location: &str,
) -> MiCommand {
    let mut cmd = MiCommand::mi("-break-insert");
    if temporary {
        cmd = cmd.option("-t");
    }
    if hardware {
        cmd = cmd.option("-h");
    }
    if let Some(cond) = condition {
        cmd = cmd.option("-c").option(cond);
    }
    if let Some(count) = ignore_count {
        cmd = cmd.option("-i").option(count.to_string());
    }
    cmd.param(location)
}

/// The condition goes to GDB exactly as typed; older GDBs reject a quoted
/// condition expression.
pub fn break_condition(number: u32, condition: &str) -> MiCommand {
    MiCommand::mi("-break-condition")
        .param(number.to_string())
        .param_no_change(condition)
}

pub fn break_after(number: u32, count: u32) -> MiCommand {
    MiCommand::mi("-break-after")
        .param(number.to_string())
        .param(count.to_string())
}

pub fn break_delete(numbers: &[u32]) -> MiCommand {
    let mut cmd = MiCommand::mi("-break-delete");
    for n in numbers {
        cmd = cmd.param(n.to_string());
    }
    cmd
}

pub fn break_enable(numbers: &[u32]) -> MiCommand {
    let mut cmd = MiCommand::mi("-break-enable");
    for n in numbers {
        cmd = cmd.param(n.to_string());
    }
    cmd
}

pub fn break_disable(numbers: &[u32]) -> MiCommand {
    let mut cmd = MiCommand::mi("-break-disable");
    for n in numbers {
        cmd = cmd.param(n.to_string());
    }
    cmd
}

pub fn break_list() -> MiCommand {
    MiCommand::mi("-break-list")
}

/// Access mode of a watchpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Write,
    Read,
    Access,
}

pub fn break_watch(expression: &str, mode: WatchMode) -> MiCommand {
    let mut cmd = MiCommand::mi("-break-watch");
    match mode {
        WatchMode::Write => {}
        WatchMode::Read => cmd = cmd.option("-r"),
        WatchMode::Access => cmd = cmd.option("-a"),
    }
    cmd.param(expression)
}

// ---- stack ----

pub fn stack_list_frames() -> MiCommand {
    MiCommand::mi("-stack-list-frames")
}

pub fn stack_list_frames_range(low: u32, high: u32) -> MiCommand {
    MiCommand::mi("-stack-list-frames")
        .param(low.to_string())
        .param(high.to_string())
}

pub fn stack_info_depth(max_depth: Option<u32>) -> MiCommand {
    let cmd = MiCommand::mi("-stack-info-depth");
    match max_depth {
        Some(depth) => cmd.param(depth.to_string()),
        None => cmd,
    }
}

/// Used instead of `--frame` against debuggers that predate the option.
pub fn stack_select_frame(level: u32) -> MiCommand {
    MiCommand::mi("-stack-select-frame")
        .forbid_thread_and_frame()
        .param(level.to_string())
}

/// Which values `-stack-list-*` should print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintValues {
    NoValues,
    AllValues,
    SimpleValues,
}

impl PrintValues {
    fn as_option(self) -> &'static str {
        match self {
            PrintValues::NoValues => "--no-values",
            PrintValues::AllValues => "--all-values",
            PrintValues::SimpleValues => "--simple-values",
        }
    }
}

pub fn stack_list_variables(print_values: PrintValues) -> MiCommand {
    MiCommand::mi("-stack-list-variables").option(print_values.as_option())
}

pub fn stack_list_locals(print_values: PrintValues) -> MiCommand {
    MiCommand::mi("-stack-list-locals").option(print_values.as_option())
}

pub fn stack_list_arguments(print_values: PrintValues) -> MiCommand {
    MiCommand::mi("-stack-list-arguments").option(print_values.as_option())
}

// ---- threads and thread groups ----

/// Changes the selection itself, so the `--thread` qualifier is illegal.
pub fn thread_select(id: &str) -> MiCommand {
    MiCommand::mi("-thread-select")
        .forbid_thread_and_frame()
        .param(id)
}

pub fn thread_info(id: Option<&str>) -> MiCommand {
    let cmd = MiCommand::mi("-thread-info");
    match id {
        Some(id) => cmd.param(id),
        None => cmd,
    }
}

pub fn thread_list_ids() -> MiCommand {
    MiCommand::mi("-thread-list-ids")
}

pub fn list_thread_groups() -> MiCommand {
    MiCommand::mi("-list-thread-groups")
}

pub fn list_thread_groups_available() -> MiCommand {
    MiCommand::mi("-list-thread-groups").option("--available")
}

// ---- data ----

pub fn data_evaluate_expression(expression: &str) -> MiCommand {
    MiCommand::mi("-data-evaluate-expression").param(expression)
}

pub fn data_list_register_names() -> MiCommand {
    MiCommand::mi("-data-list-register-names")
}

/// `format` is GDB's single-letter format code (`x`, `d`, `o`, ...).
/// An empty `registers` slice fetches all of them.
pub fn data_list_register_values(format: char, registers: &[u32]) -> MiCommand {
    let mut cmd = MiCommand::mi("-data-list-register-values").param(format.to_string());
    for r in registers {
        cmd = cmd.param(r.to_string());
    }
    cmd
}

pub fn data_read_memory_bytes(address: &str, count: u64) -> MiCommand {
    MiCommand::mi("-data-read-memory-bytes")
        .param(address)
        .param(count.to_string())
}

/// `contents` is hex-encoded, two digits per byte.
pub fn data_write_memory_bytes(address: &str, contents: &str) -> MiCommand {
    MiCommand::mi("-data-write-memory-bytes")
        .param(address)
        .param(contents)
}

/// Disassembly over an address range. The wire line matches what GDB
/// expects verbatim: `-data-disassemble -s <start> -e <end> -- <mode>`,
/// with the `--` mandated by GDB even though no value starts with a dash.
pub fn data_disassemble(start: &str, end: &str, mode: u32) -> MiCommand {
    let mut cmd = MiCommand::mi("-data-disassemble");
    cmd.set_parameters(vec![
        Adjustable::no_change("-s"),
        Adjustable::parameter(start),
        Adjustable::no_change("-e"),
        Adjustable::parameter(end),
        Adjustable::no_change("--"),
        Adjustable::parameter(mode.to_string()),
    ]);
    cmd
}

// ---- variable objects ----

pub fn var_create(name: &str, frame: &str, expression: &str) -> MiCommand {
    MiCommand::mi("-var-create")
        .param(name)
        .param(frame)
        .param(expression)
}

pub fn var_delete(name: &str) -> MiCommand {
    MiCommand::mi("-var-delete").param(name)
}

pub fn var_list_children(name: &str) -> MiCommand {
    MiCommand::mi("-var-list-children").param(name)
}

pub fn var_evaluate_expression(name: &str) -> MiCommand {
    MiCommand::mi("-var-evaluate-expression").param(name)
}

// ---- environment and session ----

pub fn environment_cd(path: &str) -> MiCommand {
    MiCommand::mi("-environment-cd").param(path)
}

pub fn gdb_set(variable: &str, value: &str) -> MiCommand {
    MiCommand::mi("-gdb-set").param(variable).param(value)
}

/// Paths must arrive unmodified; quoting a search path changes its
/// meaning to GDB.
pub fn gdb_set_solib_search_path(path: &str) -> MiCommand {
    MiCommand::mi("-gdb-set")
        .param("solib-search-path")
        .param_no_change(path)
}

pub fn gdb_set_solib_absolute_prefix(path: &str) -> MiCommand {
    MiCommand::mi("-gdb-set")
        .param("solib-absolute-prefix")
        .param_no_change(path)
}

pub fn gdb_exit() -> MiCommand {
    MiCommand::mi("-gdb-exit")
}

pub fn gdb_version() -> MiCommand {
    MiCommand::mi("-gdb-version")
}

/// Run a console command through the MI interpreter, with a proper
/// result record; preferred over a raw CLI line when an answer matters.
pub fn interpreter_exec_console(command: &str) -> MiCommand {
    MiCommand::mi("-interpreter-exec")
        .param("console")
        .param(command)
}

pub fn inferior_tty_set(tty: &str) -> MiCommand {
    MiCommand::mi("-inferior-tty-set").param(tty)
}
