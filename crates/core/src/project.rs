//! Read-only project input: the product under analysis and its competitors.
//!
//! A [`Project`] is assembled by the persistence layer and handed to the
//! report generator as an immutable value. Competitor snapshots are kept
//! newest first; only the head of the list is ever used.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// The product a project tracks competitors for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
}

/// A captured page of competitor content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub content: serde_json::Value,
    pub url: String,
    pub captured_at: Timestamp,
}

/// A competitor with its captured snapshots, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: DbId,
    pub name: String,
    pub snapshots: Vec<Snapshot>,
}

impl Competitor {
    /// A competitor is data-ready once at least one snapshot exists.
    pub fn is_data_ready(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// The most recent snapshot, if any.
    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }
}

/// A project with its product and ordered competitor set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub product: Product,
    pub competitors: Vec<Competitor>,
}

impl Project {
    /// Number of competitors with at least one snapshot.
    pub fn ready_competitor_count(&self) -> usize {
        self.competitors.iter().filter(|c| c.is_data_ready()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn snapshot(day: u32) -> Snapshot {
        Snapshot {
            content: serde_json::json!({ "title": "Pricing" }),
            url: "https://example.com/pricing".to_string(),
            captured_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        }
    }

    fn competitor(id: DbId, snapshots: Vec<Snapshot>) -> Competitor {
        Competitor {
            id,
            name: format!("Competitor {id}"),
            snapshots,
        }
    }

    #[test]
    fn competitor_without_snapshots_is_not_ready() {
        assert!(!competitor(1, vec![]).is_data_ready());
        assert!(competitor(2, vec![snapshot(1)]).is_data_ready());
    }

    #[test]
    fn latest_snapshot_is_head_of_list() {
        let c = competitor(1, vec![snapshot(9), snapshot(2)]);
        assert_eq!(c.latest_snapshot().unwrap().captured_at.format("%d").to_string(), "09");
    }

    #[test]
    fn ready_count_ignores_empty_competitors() {
        let project = Project {
            id: 7,
            name: "Acme".to_string(),
            product: Product {
                name: "Acme CRM".to_string(),
                website: None,
                description: None,
            },
            competitors: vec![
                competitor(1, vec![snapshot(1)]),
                competitor(2, vec![]),
                competitor(3, vec![snapshot(2)]),
            ],
        };
        assert_eq!(project.ready_competitor_count(), 2);
    }
}
