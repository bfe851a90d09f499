use anyhow::{Context, Result};

pub const SERVICE_NAME: &str = "com.photorenamer.apikey";
pub const ACCOUNT: &str = "GeminiAPIKey";

/// API key stored in the OS keychain under a fixed service/account pair.
pub struct KeychainStore {
    entry: keyring::Entry,
}

impl KeychainStore {
    pub fn new() -> Result<Self> {
        let entry = keyring::Entry::new(SERVICE_NAME, ACCOUNT)
            .context("Failed to open keychain entry")?;
        Ok(Self { entry })
    }

    /// Returns the stored key, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read API key from keychain"),
        }
    }

    pub fn save(&self, key: &str) -> Result<()> {
        self.entry
            .set_password(key)
            .context("Failed to save API key to keychain")?;
        log::info!("Saved API key to keychain");
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                log::info!("Removed API key from keychain");
                Ok(())
            }
            Err(e) => Err(e).context("Failed to delete API key from keychain"),
        }
    }
}
