//! Per-partition duplicate detection by phone or website.

use crate::error::Result;
use crate::router::{PHONE_COLUMN, PartitionHandle, WEBSITE_COLUMN};
use crate::store::TabularStore;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FieldKind {
    Phone,
    Website,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Remembers which phone numbers and websites a partition already holds.
///
/// A value not yet cached costs one scan of the partition; the scan result is
/// cached, and the same lookup is not repeated.
pub(crate) struct DuplicateGuard {
    store: Arc<dyn TabularStore>,
    seen: HashSet<(String, FieldKind, String)>,
    scanned: HashSet<(String, Option<String>, Option<String>)>,
}

impl DuplicateGuard {
    pub(crate) fn new(store: Arc<dyn TabularStore>) -> Self {
        Self {
            store,
            seen: HashSet::new(),
            scanned: HashSet::new(),
        }
    }

    fn cached(&self, partition: &str, kind: FieldKind, value: &str) -> bool {
        self.seen
            .contains(&(partition.to_string(), kind, value.to_string()))
    }

    /// True when the phone or website is already recorded in the partition.
    /// Store failures are logged and answered with `false`.
    pub(crate) async fn is_duplicate(
        &mut self,
        phone: Option<&str>,
        website: Option<&str>,
        partition: &PartitionHandle,
    ) -> bool {
        let phone = non_blank(phone);
        let website = non_blank(website);
        if phone.is_none() && website.is_none() {
            return false;
        }

        let name = partition.name.as_str();
        if phone.is_some_and(|p| self.cached(name, FieldKind::Phone, p))
            || website.is_some_and(|w| self.cached(name, FieldKind::Website, w))
        {
            return true;
        }

        let scan_key = (
            name.to_string(),
            phone.map(str::to_string),
            website.map(str::to_string),
        );
        if self.scanned.contains(&scan_key) {
            return false;
        }

        if let Err(e) = self.scan(name).await {
            tracing::warn!(target: "dedup_task", "Duplicate check on '{}' failed: {}", name, e);
            return false;
        }
        self.scanned.insert(scan_key);

        phone.is_some_and(|p| self.cached(name, FieldKind::Phone, p))
            || website.is_some_and(|w| self.cached(name, FieldKind::Website, w))
    }

    async fn scan(&mut self, partition: &str) -> Result<()> {
        let rows = self
            .store
            .read_range(partition, PHONE_COLUMN..WEBSITE_COLUMN + 1)
            .await?;
        let phone_idx = 0;
        let website_idx = WEBSITE_COLUMN - PHONE_COLUMN;

        for row in rows.iter().skip(1) {
            if let Some(phone) = non_blank(row.get(phone_idx).map(String::as_str)) {
                self.seen
                    .insert((partition.to_string(), FieldKind::Phone, phone.to_string()));
            }
            if let Some(website) = non_blank(row.get(website_idx).map(String::as_str)) {
                self.seen.insert((
                    partition.to_string(),
                    FieldKind::Website,
                    website.to_string(),
                ));
            }
        }
        tracing::debug!(
            target: "dedup_task",
            "Scanned {} rows of '{}'",
            rows.len().saturating_sub(1),
            partition
        );
        Ok(())
    }

    /// Caches the identifiers of a lead that was just appended.
    pub(crate) fn record(&mut self, phone: Option<&str>, website: Option<&str>, partition: &PartitionHandle) {
        if let Some(phone) = non_blank(phone) {
            self.seen
                .insert((partition.name.clone(), FieldKind::Phone, phone.to_string()));
        }
        if let Some(website) = non_blank(website) {
            self.seen
                .insert((partition.name.clone(), FieldKind::Website, website.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::LEAD_HEADERS;
    use crate::store::MemoryStore;

    fn handle(name: &str) -> PartitionHandle {
        PartitionHandle {
            key: name.to_string(),
            name: name.to_string(),
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.create_partition("India").await.unwrap();
        store
            .append_row("India", LEAD_HEADERS.iter().map(|h| h.to_string()).collect())
            .await
            .unwrap();
        let mut row = vec![String::new(); 14];
        row[PHONE_COLUMN] = "022 111".to_string();
        row[WEBSITE_COLUMN] = "https://old.example.in".to_string();
        store.append_row("India", row).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_existing_phone_or_website_is_duplicate() {
        let store = seeded_store().await;
        let mut guard = DuplicateGuard::new(store.clone());
        let india = handle("India");

        assert!(guard.is_duplicate(Some("022 111"), None, &india).await);
        assert!(guard.is_duplicate(None, Some("https://old.example.in"), &india).await);
        assert!(!guard.is_duplicate(Some("022 999"), Some("https://new.in"), &india).await);
        // Same answers again, idempotent.
        assert!(guard.is_duplicate(Some("022 111"), None, &india).await);
        assert!(!guard.is_duplicate(Some("022 999"), Some("https://new.in"), &india).await);
    }

    #[tokio::test]
    async fn test_blank_values_skip_io() {
        let store = seeded_store().await;
        let mut guard = DuplicateGuard::new(store.clone());

        assert!(!guard.is_duplicate(Some("  "), None, &handle("India")).await);
        assert!(!guard.is_duplicate(None, None, &handle("India")).await);
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_header_row_is_not_a_value() {
        let store = seeded_store().await;
        let mut guard = DuplicateGuard::new(store);
        assert!(!guard.is_duplicate(Some("Phone"), Some("Website"), &handle("India")).await);
    }

    #[tokio::test]
    async fn test_repeat_lookups_are_served_from_cache() {
        let store = seeded_store().await;
        let mut guard = DuplicateGuard::new(store.clone());
        let india = handle("India");

        guard.is_duplicate(Some("022 111"), None, &india).await;
        guard.is_duplicate(Some("022 111"), None, &india).await;
        guard.is_duplicate(Some("022 999"), None, &india).await;
        guard.is_duplicate(Some("022 999"), None, &india).await;

        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_record_marks_new_values() {
        let store = seeded_store().await;
        let mut guard = DuplicateGuard::new(store);
        let india = handle("India");

        assert!(!guard.is_duplicate(Some("022 777"), None, &india).await);
        guard.record(Some("022 777"), Some("https://fresh.in"), &india);
        assert!(guard.is_duplicate(Some("022 777"), None, &india).await);
        assert!(guard.is_duplicate(None, Some("https://fresh.in"), &india).await);
        assert!(!guard.is_duplicate(Some("022 777"), None, &handle("Nepal")).await);
    }

    #[tokio::test]
    async fn test_store_error_is_not_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let mut guard = DuplicateGuard::new(store);
        assert!(!guard.is_duplicate(Some("022 111"), None, &handle("Missing")).await);
    }
}
