use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use ts_rs::TS;

/// SQLite treats a negative LIMIT as "no limit".
pub const NO_LIMIT: i64 = -1;

/// `limit`/`offset` window for list queries.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Pagination {
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<i64>")]
    pub limit: Option<i64>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<i64>")]
    pub offset: Option<i64>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 500;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = Pagination::default();
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_limits_are_clamped() {
        assert_eq!(Pagination::new(10_000, -5).limit(), 500);
        assert_eq!(Pagination::new(0, -5).limit(), 1);
        assert_eq!(Pagination::new(0, -5).offset(), 0);
    }
}
