//! Command execution against the host, with per-command output capture
//! and error classification.
//!
//! Execution is strictly sequential and never short-circuits: a failed
//! command is reported and the batch keeps going, because partial
//! failure is a first-class outcome the user sees per command.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::host::{HostCapability, OutputCapture};

// ── Error classification ─────────────────────────────────────────

/// Taxonomy of host command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Selection,
    Object,
    Command,
    File,
    Argument,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Selection => "Selection",
            ErrorKind::Object => "Object",
            ErrorKind::Command => "Command",
            ErrorKind::File => "File",
            ErrorKind::Argument => "Argument",
        }
    }
}

/// Pattern families in priority order: first match wins. The selection
/// family deliberately claims "unknown object" before the object
/// family runs, matching long-standing plugin behavior.
static ERROR_PATTERNS: LazyLock<Vec<(ErrorKind, Regex)>> = LazyLock::new(|| {
    [
        (
            ErrorKind::Selection,
            r"(?i)(selection|selector).*?not found|unknown (selection|object)",
        ),
        (ErrorKind::Object, r"(?i)object .*? not found|unknown object"),
        (
            ErrorKind::Command,
            r"(?i)unknown command|invalid command|syntax error",
        ),
        (
            ErrorKind::File,
            r"(?i)(file|directory).*?not found|cannot open",
        ),
        (
            ErrorKind::Argument,
            r"(?i)invalid argument|wrong number of arguments|missing required argument",
        ),
    ]
    .into_iter()
    .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (kind, re)))
    .collect()
});

/// Classify raw host error text into a labeled, human-readable message.
pub fn classify_error(raw: &str) -> String {
    let message = raw.trim();
    if message.is_empty() {
        return "Unknown error occurred".to_string();
    }
    for (kind, pattern) in ERROR_PATTERNS.iter() {
        if pattern.is_match(message) {
            return format!("{} error: {message}", kind.label());
        }
    }
    format!("Error: {message}")
}

// ── Execution ────────────────────────────────────────────────────

/// Outcome of one executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub command: String,
    pub output: String,
    pub success: bool,
}

/// Execute one command against the host.
///
/// Blank commands are skipped without touching the host. Otherwise the
/// host's output/error channels are captured for exactly the duration
/// of the call (restored on every exit path by the [`OutputCapture`]
/// guard), and the result is, in order: a classified raised error, a
/// classified error-channel message, the trimmed output text, or an
/// `Executed:` acknowledgement when the command was silent.
pub fn execute_command(command: &str, host: &mut dyn HostCapability) -> (String, bool) {
    let command = command.trim();
    if command.is_empty() {
        return ("Empty command skipped".to_string(), true);
    }

    let mut capture = OutputCapture::begin(host);
    let run_result = capture.host().run(command);
    let captured = capture.finish();

    if let Err(raised) = run_result {
        return (classify_error(&raised), false);
    }
    if !captured.stderr.is_empty() {
        return (classify_error(&captured.stderr), false);
    }
    if !captured.stdout.is_empty() {
        return (captured.stdout.trim().to_string(), true);
    }
    (format!("Executed: {command}"), true)
}

/// Execute a sequence of commands in order. Blank entries are skipped
/// entirely (not even recorded); failures do not stop the batch.
pub fn execute_commands(commands: &[String], host: &mut dyn HostCapability) -> Vec<CommandResult> {
    let mut results = Vec::new();
    for command in commands {
        if command.trim().is_empty() {
            continue;
        }
        let (output, success) = execute_command(command, host);
        results.push(CommandResult {
            command: command.clone(),
            output,
            success,
        });
    }
    results
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::host::CapturedOutput;
    use std::path::Path;

    /// Host whose `run` outcome is scripted per command.
    #[derive(Default)]
    struct ScriptedHost {
        /// (stdout, stderr, raised) for the next run calls, in order.
        script: Vec<(String, String, Option<String>)>,
        ran: Vec<String>,
        pending: CapturedOutput,
        capturing: bool,
    }

    impl ScriptedHost {
        fn push(&mut self, stdout: &str, stderr: &str, raised: Option<&str>) {
            self.script.push((
                stdout.to_string(),
                stderr.to_string(),
                raised.map(str::to_string),
            ));
        }
    }

    impl HostCapability for ScriptedHost {
        fn get_names(&self) -> Result<Vec<Vec<String>>, String> {
            Ok(vec![])
        }
        fn get_object_list(&self) -> Result<Vec<String>, String> {
            Ok(vec![])
        }
        fn count_atoms(&self, _object: &str) -> Result<u32, String> {
            Ok(0)
        }
        fn get_view(&self) -> Result<Vec<f64>, String> {
            Ok(vec![])
        }
        fn run(&mut self, command: &str) -> Result<(), String> {
            assert!(self.capturing, "run outside a capture scope");
            self.ran.push(command.to_string());
            let (stdout, stderr, raised) = if self.script.is_empty() {
                (String::new(), String::new(), None)
            } else {
                self.script.remove(0)
            };
            self.pending.stdout = stdout;
            self.pending.stderr = stderr;
            match raised {
                Some(msg) => Err(msg),
                None => Ok(()),
            }
        }
        fn redirect_output(&mut self) {
            self.capturing = true;
        }
        fn take_output(&mut self) -> CapturedOutput {
            self.capturing = false;
            std::mem::take(&mut self.pending)
        }
        fn render_png(&mut self, _path: &Path, _dpi: f64, _ray: bool) -> Result<(), String> {
            Ok(())
        }
    }

    // ── Classifier ───────────────────────────────────────────────

    #[test]
    fn classify_blank_is_unknown() {
        assert_eq!(classify_error(""), "Unknown error occurred");
        assert_eq!(classify_error("   \n"), "Unknown error occurred");
    }

    #[test]
    fn classify_object_not_found() {
        let msg = classify_error("object foo not found");
        assert_eq!(msg, "Object error: object foo not found");
    }

    #[test]
    fn classify_selection_claims_unknown_object() {
        // "unknown object" belongs to the selection family, which runs first.
        assert_eq!(
            classify_error("unknown object: bar"),
            "Selection error: unknown object: bar"
        );
        assert_eq!(
            classify_error("Selection \"sele1\" not found"),
            "Selection error: Selection \"sele1\" not found"
        );
    }

    #[test]
    fn classify_command_file_argument() {
        assert!(classify_error("Unknown command: showw").starts_with("Command error:"));
        assert!(classify_error("Syntax error at token 3").starts_with("Command error:"));
        assert!(classify_error("cannot open /tmp/x.pdb").starts_with("File error:"));
        assert!(classify_error("File \"x.pdb\" not found").starts_with("File error:"));
        assert!(classify_error("wrong number of arguments").starts_with("Argument error:"));
    }

    #[test]
    fn classify_unmatched_gets_generic_prefix() {
        assert_eq!(classify_error("segfault in renderer"), "Error: segfault in renderer");
    }

    // ── execute_command ──────────────────────────────────────────

    #[test]
    fn blank_command_never_invokes_host() {
        let mut host = ScriptedHost::default();
        assert_eq!(
            execute_command("", &mut host),
            ("Empty command skipped".to_string(), true)
        );
        assert_eq!(
            execute_command("   ", &mut host),
            ("Empty command skipped".to_string(), true)
        );
        assert!(host.ran.is_empty());
    }

    #[test]
    fn silent_command_acknowledged() {
        let mut host = ScriptedHost::default();
        let (msg, ok) = execute_command("  show cartoon, all  ", &mut host);
        assert!(ok);
        assert_eq!(msg, "Executed: show cartoon, all");
        assert_eq!(host.ran, ["show cartoon, all"]);
    }

    #[test]
    fn stdout_is_trimmed_and_returned() {
        let mut host = ScriptedHost::default();
        host.push(" Selector: selection \"sele\" defined with 42 atoms.\n", "", None);
        let (msg, ok) = execute_command("select sele, chain A", &mut host);
        assert!(ok);
        assert_eq!(msg, "Selector: selection \"sele\" defined with 42 atoms.");
    }

    #[test]
    fn stderr_is_classified_as_failure() {
        let mut host = ScriptedHost::default();
        host.push("", "object nonexistent not found\n", None);
        let (msg, ok) = execute_command("zoom nonexistent", &mut host);
        assert!(!ok);
        assert_eq!(msg, "Object error: object nonexistent not found");
    }

    #[test]
    fn raised_error_is_classified_and_capture_restored() {
        let mut host = ScriptedHost::default();
        host.push("", "", Some("invalid argument to turn"));
        let (msg, ok) = execute_command("turn q, 90", &mut host);
        assert!(!ok);
        assert_eq!(msg, "Argument error: invalid argument to turn");
        assert!(!host.capturing, "capture must be released after an error");
    }

    // ── execute_commands ─────────────────────────────────────────

    #[test]
    fn batch_skips_blanks_and_preserves_order() {
        let mut host = ScriptedHost::default();
        let commands = vec![
            "show cartoon, all".to_string(),
            String::new(),
            "   ".to_string(),
            "hide everything".to_string(),
        ];
        let results = execute_commands(&commands, &mut host);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].command, "show cartoon, all");
        assert_eq!(results[1].command, "hide everything");
    }

    #[test]
    fn batch_does_not_short_circuit_on_failure() {
        let mut host = ScriptedHost::default();
        host.push("", "unknown command: frobnicate", None);
        host.push("", "", None);
        let commands = vec!["frobnicate".to_string(), "show sticks".to_string()];
        let results = execute_commands(&commands, &mut host);
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
        assert_eq!(results[1].output, "Executed: show sticks");
    }
}
