use anyhow::Context;
use paperstack_core::storage::Store;

pub mod cli;
pub mod commands;
pub mod logging;
pub mod settings;

use settings::Settings;

pub struct AppContext {
    pub settings: Settings,
    pub store: Store,
}

impl AppContext {
    /// Opens the store named by `settings`.
    pub async fn open(settings: Settings) -> anyhow::Result<Self> {
        let store = Store::open(&settings.xochitl_dir)
            .await
            .with_context(|| format!("Failed to open store at {}", settings.xochitl_dir.display()))?;
        Ok(AppContext { settings, store })
    }
}
