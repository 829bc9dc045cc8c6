//! Page windows for list endpoints (the organizer review queue, team
//! listings). Limits are clamped here so every caller gets the same bounds.

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl LimitOffset {
    /// Builds a window from raw query parameters: missing values fall back
    /// to the defaults, the limit is clamped to `1..=MAX_LIMIT`, and a
    /// negative offset becomes 0.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit_into_bounds() {
        assert_eq!(LimitOffset::clamped(Some(0), None).limit, 1);
        assert_eq!(LimitOffset::clamped(Some(-5), None).limit, 1);
        assert_eq!(LimitOffset::clamped(Some(10_000), None).limit, MAX_LIMIT);
        assert_eq!(LimitOffset::clamped(Some(25), None).limit, 25);
    }

    #[test]
    fn defaults_and_negative_offset() {
        let page = LimitOffset::default();
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
        assert_eq!(LimitOffset::clamped(None, Some(-10)).offset, 0);
        assert_eq!(LimitOffset::clamped(None, Some(30)).offset, 30);
    }
}
