//! Capability boundary to the visualization host.
//!
//! The chat pipeline never links against the host engine directly; it
//! drives whatever implements [`HostCapability`]. Host errors cross the
//! boundary as raw message strings because that text is exactly what
//! the error classifier pattern-matches on.

use std::path::Path;

/// Text the host wrote to its output and error channels while a
/// command ran.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Everything the pipeline needs from the host engine.
pub trait HostCapability {
    /// Raw name listing; the first inner list is the flat object names.
    fn get_names(&self) -> Result<Vec<Vec<String>>, String>;

    /// Names of all loaded objects.
    fn get_object_list(&self) -> Result<Vec<String>, String>;

    /// Atom count for one object.
    fn count_atoms(&self, object: &str) -> Result<u32, String>;

    /// Current camera/view transform vector.
    fn get_view(&self) -> Result<Vec<f64>, String>;

    /// Execute one command. Output lands on the host's output/error
    /// channels, not in the return value; `Err` carries the raised
    /// error text.
    fn run(&mut self, command: &str) -> Result<(), String>;

    /// Start capturing the host's output and error channels.
    fn redirect_output(&mut self);

    /// Stop capturing and hand back whatever was written since
    /// [`redirect_output`](HostCapability::redirect_output).
    fn take_output(&mut self) -> CapturedOutput;

    /// Render the current view to a PNG file at `path`.
    fn render_png(&mut self, path: &Path, dpi: f64, ray: bool) -> Result<(), String>;
}

// ── Scoped output redirection ────────────────────────────────────

/// RAII scope around the host's output redirection. Construction
/// redirects; `finish` collects the captured text; dropping the guard
/// without finishing still restores the channels, so an early return
/// or panic between `begin` and `finish` cannot leak redirection into
/// unrelated host calls.
pub struct OutputCapture<'a> {
    host: &'a mut dyn HostCapability,
    finished: bool,
}

impl<'a> OutputCapture<'a> {
    pub fn begin(host: &'a mut dyn HostCapability) -> Self {
        host.redirect_output();
        Self {
            host,
            finished: false,
        }
    }

    /// The host, for issuing calls while the capture scope is active.
    pub fn host(&mut self) -> &mut dyn HostCapability {
        self.host
    }

    /// End the scope and return the captured output.
    pub fn finish(mut self) -> CapturedOutput {
        self.finished = true;
        self.host.take_output()
    }
}

impl Drop for OutputCapture<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.host.take_output();
        }
    }
}
