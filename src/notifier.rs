use anyhow::Result;

/// Delivers user-facing messages such as "file renamed".
pub trait Notifier: Send {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Writes notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        log::info!("{}: {}", title, message);
        Ok(())
    }
}
