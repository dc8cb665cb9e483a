//! Maps a lead to its destination partition and writes it there.

use crate::error::Result;
use crate::models::{Lead, Locality};
use crate::store::TabularStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const LEAD_HEADERS: [&str; 14] = [
    "Country",
    "City",
    "Category",
    "Business Name",
    "Phone",
    "Email",
    "Website",
    "Address",
    "Rating",
    "Review Count",
    "Lead Score",
    "Value Justification",
    "Run ID",
    "Timestamp",
];

pub(crate) const PHONE_COLUMN: usize = 4;
pub(crate) const WEBSITE_COLUMN: usize = 6;

/// How leads are split across partitions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PartitionGranularity {
    /// One partition per country.
    #[default]
    Country,
    /// One partition per (country, city).
    CountryCity,
}

/// A resolved partition: the logical key and its sanitized storage name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PartitionHandle {
    pub key: String,
    pub name: String,
}

/// Keeps alphanumerics, spaces and hyphens, then turns whitespace runs into `-`.
pub(crate) fn sanitize_partition_name(key: &str) -> String {
    let kept: String = key
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

pub(crate) struct DestinationRouter {
    store: Arc<dyn TabularStore>,
    granularity: PartitionGranularity,
    resolved: HashMap<String, PartitionHandle>,
}

impl DestinationRouter {
    pub(crate) fn new(store: Arc<dyn TabularStore>, granularity: PartitionGranularity) -> Self {
        Self {
            store,
            granularity,
            resolved: HashMap::new(),
        }
    }

    pub(crate) fn destination_key(&self, locality: &Locality) -> String {
        match self.granularity {
            PartitionGranularity::Country => locality.country.clone(),
            PartitionGranularity::CountryCity => {
                format!("{} {}", locality.country, locality.city)
            }
        }
    }

    /// Returns the partition for `key`, creating it and its header row on first use.
    pub(crate) async fn resolve_and_ensure(&mut self, key: &str) -> Result<PartitionHandle> {
        if let Some(handle) = self.resolved.get(key) {
            return Ok(handle.clone());
        }

        let name = sanitize_partition_name(key);
        if !self.store.partition_exists(&name).await? {
            tracing::info!(target: "router_task", "Creating partition '{}' for {}", name, key);
            self.store.create_partition(&name).await?;
        }

        let first_row = self.store.read_range(&name, 0..1).await?;
        if first_row.is_empty() {
            let header = LEAD_HEADERS.iter().map(|h| h.to_string()).collect();
            self.store.append_row(&name, header).await?;
            tracing::debug!(target: "router_task", "Wrote header row to '{}'", name);
        }

        let handle = PartitionHandle {
            key: key.to_string(),
            name,
        };
        self.resolved.insert(key.to_string(), handle.clone());
        Ok(handle)
    }

    pub(crate) async fn append(&self, handle: &PartitionHandle, lead: &Lead) -> Result<()> {
        self.store.append_row(&handle.name, lead.to_row()).await?;
        tracing::debug!(
            target: "router_task",
            "Appended '{}' to '{}' ({})",
            lead.business_name,
            handle.name,
            handle.key
        );
        Ok(())
    }
}
