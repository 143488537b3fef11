use serde::{Deserialize, Serialize};

use super::enums::{BodyZone, Severity};

/// Catalog filter for condition listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionFilter {
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    pub zone: Option<BodyZone>,
    pub severity: Option<Severity>,
}

/// Page request for consultation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationQuery {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive match against the patient name.
    pub search: Option<String>,
}

impl Default for ConsultationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
        }
    }
}

impl ConsultationQuery {
    pub fn offset(&self) -> u32 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &ConsultationQuery, total: u64) -> Self {
        let limit = u64::from(query.limit.max(1));
        Self {
            items,
            page: query.page.max(1),
            limit: query.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}
