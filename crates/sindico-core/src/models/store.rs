//! Logical record collections kept in the offline cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A logical collection of records synchronized between device and server
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Store {
    /// Condominium announcements
    Announcements,
    /// Resident polls and votes
    Polls,
    /// Maintenance work orders
    MaintenanceOrders,
    /// Monthly financial statements
    FinancialStatements,
    /// Document library entries
    Documents,
    /// Shared links
    SharedLinks,
    /// Resident notifications
    Notifications,
    /// Digital magazine editions
    Magazine,
}

impl Store {
    /// Every known store, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Announcements,
        Self::Polls,
        Self::MaintenanceOrders,
        Self::FinancialStatements,
        Self::Documents,
        Self::SharedLinks,
        Self::Notifications,
        Self::Magazine,
    ];

    /// Stable name used in storage and exports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Announcements => "announcements",
            Self::Polls => "polls",
            Self::MaintenanceOrders => "maintenance_orders",
            Self::FinancialStatements => "financial_statements",
            Self::Documents => "documents",
            Self::SharedLinks => "shared_links",
            Self::Notifications => "notifications",
            Self::Magazine => "magazine",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Store {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|store| store.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown store '{}'", s.trim())))
    }
}
