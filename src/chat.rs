//! One chat turn, end to end: refresh session state from the host,
//! translate the request, execute the resulting commands in order,
//! record outcomes, and render a per-command report.
//!
//! The turn is strictly sequential — each command blocks until the
//! host returns, because host state mutations must apply in the
//! user-visible causal order (a `hide` before a `show` cannot be
//! reordered). The send affordance is disabled for the duration and
//! re-enabled on every exit path by [`BusyGuard`].

use crate::error::ChatError;
use crate::executor::{execute_commands, CommandResult};
use crate::host::HostCapability;
use crate::llm::LlmClient;
use crate::session::ChatSession;
use crate::sink::MessageSink;
use crate::translator::translate;

/// RAII scope for the sink's busy state. Construction disables the
/// send affordance; drop re-enables it, whether the turn succeeded,
/// failed, or unwound.
struct BusyGuard<'a> {
    sink: &'a dyn MessageSink,
}

impl<'a> BusyGuard<'a> {
    fn begin(sink: &'a dyn MessageSink) -> Self {
        sink.set_busy(true);
        Self { sink }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.sink.set_busy(false);
    }
}

/// Process one user utterance through the whole pipeline.
///
/// Failures before execution (missing API key, unsupported provider,
/// API errors) are rendered as a single error message and returned;
/// per-command failures are not errors at this level — they appear in
/// the report and the returned results.
pub fn process_turn(
    session: &mut ChatSession,
    host: &mut dyn HostCapability,
    client: &dyn LlmClient,
    sink: &dyn MessageSink,
    message: &str,
) -> Result<Vec<CommandResult>, ChatError> {
    sink.append_user_message(message);
    let _busy = BusyGuard::begin(sink);

    // Refresh never aborts a turn; failed fetches fall back to empty.
    session.update_from_host(host);

    let commands = match translate(message, &session.context_prompt(), client) {
        Ok(commands) => commands,
        Err(e) => {
            sink.append_error_message(&e.to_string());
            return Err(e);
        }
    };

    if commands.is_empty() {
        sink.append_bot_message("No commands were generated for that request.");
        return Ok(Vec::new());
    }

    let results = execute_commands(&commands, host);
    for result in &results {
        session.record_command(result.command.as_str(), result.success, result.output.as_str());
    }

    sink.append_bot_message(&format_report(&results));
    Ok(results)
}

/// One line per command with its ✓/✗ marker, followed by the output
/// or classified error indented beneath it.
fn format_report(results: &[CommandResult]) -> String {
    let mut lines = Vec::new();
    for result in results {
        let status = if result.success { '✓' } else { '✗' };
        lines.push(format!("{status} {}", result.command));
        if !result.output.is_empty() {
            lines.push(format!("    {}", result.output));
        }
    }
    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        lines.push(format!(
            "{failed} of {} command(s) failed.",
            results.len()
        ));
    }
    lines.join("\n")
}
