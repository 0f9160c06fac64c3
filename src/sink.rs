//! Abstraction over message display so the pipeline works without a
//! GUI. The Qt panel implements this on the host side; tests and the
//! CLI use lightweight stand-ins.

/// Where chat output goes: user/bot/error text and captured images.
pub trait MessageSink {
    fn append_user_message(&self, text: &str);
    fn append_bot_message(&self, text: &str);
    fn append_error_message(&self, text: &str);
    fn append_image(&self, bytes: &[u8]);

    /// Disable or re-enable the send affordance while a turn runs.
    fn set_busy(&self, busy: bool);
}

/// No-op sink for headless use — results are returned to the caller.
pub struct NullSink;

impl MessageSink for NullSink {
    fn append_user_message(&self, _text: &str) {}
    fn append_bot_message(&self, _text: &str) {}
    fn append_error_message(&self, _text: &str) {}
    fn append_image(&self, _bytes: &[u8]) {}
    fn set_busy(&self, _busy: bool) {}
}
