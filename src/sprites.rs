use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::fs;

use crate::client::Transport;
use crate::error::StoreResult;
use crate::store::LocalStore;

pub const DEFAULT_DOWNLOAD_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Download every record's sprite into `dir/{id}.png` and remember the path
/// in the store. Records already downloaded to that path are skipped;
/// download failures are counted and the loop moves on.
pub async fn prefetch_sprites(
    store: &LocalStore,
    transport: &dyn Transport,
    dir: &Path,
    delay: Duration,
) -> StoreResult<PrefetchReport> {
    fs::create_dir_all(dir).await?;
    let records = store.all()?;
    let total = records.len();
    let mut report = PrefetchReport::default();

    for record in records {
        let local_path = dir.join(format!("{}.png", record.id));
        let already_saved = record.sprite_path.as_deref() == Some(local_path.as_path());
        if already_saved && fs::try_exists(&local_path).await.unwrap_or(false) {
            report.skipped += 1;
            continue;
        }
        let Some(url) = record.sprite_url.as_deref() else {
            report.skipped += 1;
            continue;
        };

        log::info!("[{:03}/{total}] downloading sprite {url}", record.id);
        match transport.get_bytes(url).await {
            Ok(bytes) => {
                fs::write(&local_path, &bytes).await?;
                store.set_sprite_path(record.id, &local_path)?;
                report.downloaded += 1;
            }
            Err(err) => {
                log::warn!("sprite for #{} failed: {err}", record.id);
                report.failed += 1;
            }
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    log::info!(
        "sprite cache done: {} downloaded, {} skipped, {} failed",
        report.downloaded,
        report.skipped,
        report.failed
    );
    Ok(report)
}
