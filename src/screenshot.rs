//! Screenshot capture through the host's PNG renderer.

use std::fs;
use std::path::Path;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::host::HostCapability;
use crate::sink::MessageSink;

/// Render the current view and return the PNG bytes.
///
/// With `path` set the image is also left at that location; otherwise
/// it goes through a temp file that is removed when the capture
/// returns (the `NamedTempFile` cleans up on drop, so the file never
/// outlives this call even on an error path). `dpi` falls back to the
/// configured screenshot default.
pub fn capture_screenshot(
    host: &mut dyn HostCapability,
    path: Option<&Path>,
    dpi: Option<u32>,
    ray: bool,
    config: &ChatConfig,
) -> Result<Vec<u8>, ChatError> {
    let dpi = f64::from(dpi.unwrap_or(config.screenshot_dpi));

    if let Some(path) = path {
        render_and_read(host, path, dpi, ray)
    } else {
        let tmp = tempfile::Builder::new()
            .prefix("molecule_chat_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ChatError::Host {
                message: format!("could not create temp file: {e}"),
            })?;
        render_and_read(host, tmp.path(), dpi, ray)
    }
}

/// Capture the current view and post it to the message sink. This is
/// what the panel's screenshot action calls.
pub fn capture_to_sink(
    host: &mut dyn HostCapability,
    sink: &dyn MessageSink,
    config: &ChatConfig,
) -> Result<(), ChatError> {
    let bytes = capture_screenshot(host, None, None, false, config)?;
    sink.append_image(&bytes);
    Ok(())
}

fn render_and_read(
    host: &mut dyn HostCapability,
    path: &Path,
    dpi: f64,
    ray: bool,
) -> Result<Vec<u8>, ChatError> {
    host.render_png(path, dpi, ray)
        .map_err(|message| ChatError::Host { message })?;
    fs::read(path).map_err(|e| ChatError::Host {
        message: format!("could not read rendered image: {e}"),
    })
}
