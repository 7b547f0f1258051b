//! The metadata sync pipeline.
//!
//! For every localization of the app's latest version, in the order App Store
//! Connect lists them:
//! 1. locate the local file (exact locale, then fallback),
//! 2. load it,
//! 3. validate attribute lengths,
//! 4. submit a partial update.
//!
//! Missing, unreadable and invalid files skip the locale. Remote failures
//! abort the whole run.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::app_store::{LocalizationRecord, MetadataStore};
use crate::attributes::AttributeSet;
use crate::error::{Result, SyncError};
use crate::locator;
use crate::validator::{self, Attribute};

/// What happened to one remote locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    SkippedNoFile,
    SkippedInvalid(Vec<Attribute>),
    /// The located file could not be read or decoded
    SkippedUnreadable(String),
}

impl SyncOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SyncOutcome::Updated)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Updated => write!(f, "updated"),
            SyncOutcome::SkippedNoFile => write!(f, "skipped (no file)"),
            SyncOutcome::SkippedInvalid(failures) => {
                let names: Vec<_> = failures.iter().map(|a| a.name()).collect();
                write!(f, "skipped (invalid: {})", names.join(", "))
            }
            SyncOutcome::SkippedUnreadable(reason) => write!(f, "skipped (unreadable: {})", reason),
        }
    }
}

/// Outcome of one remote localization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleReport {
    pub localization_id: String,
    pub locale: String,
    pub outcome: SyncOutcome,
}

/// Sync every localization of the latest version of `bundle_id` from the
/// `<locale>.json` files in `directory`.
pub async fn run<S>(store: &S, bundle_id: &str, directory: &Path) -> Result<Vec<LocaleReport>>
where
    S: MetadataStore + ?Sized,
{
    let app = store.find_app(bundle_id).await?;
    let version_id = app
        .latest_version_id
        .ok_or_else(|| SyncError::NoVersion(app.id.clone()))?;

    let localization_ids = store.localization_ids(&version_id).await?;
    if localization_ids.is_empty() {
        return Err(SyncError::NoLocalizations(version_id));
    }

    info!(
        "Syncing {} localizations of version {}",
        localization_ids.len(),
        version_id
    );

    let mut reports = Vec::with_capacity(localization_ids.len());
    for id in localization_ids {
        let record = store.localization(&id).await?;
        let outcome = sync_localization(store, &record, directory).await?;

        reports.push(LocaleReport {
            localization_id: record.id,
            locale: record.locale,
            outcome,
        });
    }

    let updated = reports.iter().filter(|r| r.outcome.is_updated()).count();
    info!(
        "Finished: {} updated, {} skipped",
        updated,
        reports.len() - updated
    );

    Ok(reports)
}

/// Run locate, load, validate and submit for a single remote localization.
pub async fn sync_localization<S>(
    store: &S,
    record: &LocalizationRecord,
    directory: &Path,
) -> Result<SyncOutcome>
where
    S: MetadataStore + ?Sized,
{
    let Some(resolved) = locator::locate(&record.locale, directory) else {
        let (primary, fallback) = locator::candidates(&record.locale);
        info!(
            "No localization file found for '{}' or '{}'. Continuing",
            primary, fallback
        );
        return Ok(SyncOutcome::SkippedNoFile);
    };

    info!("🌐 Updating {} from {}.json", record.locale, resolved.locale);

    let attributes = match AttributeSet::load(&resolved.path) {
        Ok(attributes) => attributes,
        Err(e) => {
            warn!("{}. Skipping {}", e, record.locale);
            return Ok(SyncOutcome::SkippedUnreadable(e.to_string()));
        }
    };

    let report = validator::validate_all(&attributes);
    if !report.is_valid() {
        for attr in &report.failures {
            warn!(
                "The attribute '{}' is longer than {} characters.",
                attr,
                attr.max_len()
            );
        }
        warn!("Some attributes of {} are invalid. Continuing...", record.locale);
        return Ok(SyncOutcome::SkippedInvalid(report.failures));
    }

    if attributes.is_empty() {
        info!(
            "{}.json sets no attributes, {} keeps its current metadata",
            resolved.locale, record.locale
        );
    }

    store.update_localization(&record.id, &attributes).await?;
    info!("✓ Updated {}", record.locale);

    Ok(SyncOutcome::Updated)
}
