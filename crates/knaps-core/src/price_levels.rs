use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Named price points a product can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceLevelKind {
    Trade,
    #[serde(rename = "RRP")]
    Rrp,
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "MWP")]
    Mwp,
}

impl PriceLevelKind {
    pub const ALL: [PriceLevelKind; 4] = [Self::Trade, Self::Rrp, Self::Go, Self::Mwp];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trade => "Trade",
            Self::Rrp => "RRP",
            Self::Go => "GO",
            Self::Mwp => "MWP",
        }
    }

    /// Case-insensitive parse.
    ///
    /// # Errors
    ///
    /// Returns a message listing the accepted values.
    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| "must be one of Trade, RRP, GO, MWP".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceLevel {
    pub product_id: i64,
    pub price_level: PriceLevelKind,
    /// Free-text classification such as `Standard`, `Promotional` or `Bulk`.
    #[serde(rename = "type")]
    pub level_type: String,
    pub value_excl: Decimal,
    pub value_incl: Option<Decimal>,
    pub comments: Option<String>,
    pub valid_start: Option<NaiveDate>,
    pub valid_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewPriceLevel,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceLevel {
    /// `updated_at`, falling back to `created_at`.
    #[must_use]
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevelPatch {
    pub price_level: Option<PriceLevelKind>,
    pub level_type: Option<String>,
    pub value_excl: Option<Decimal>,
    pub value_incl: Option<Option<Decimal>>,
    pub comments: Option<Option<String>>,
    pub valid_start: Option<Option<NaiveDate>>,
    pub valid_end: Option<Option<NaiveDate>>,
}

impl PriceLevelPatch {
    pub fn apply(&self, target: &mut NewPriceLevel) {
        if let Some(v) = self.price_level {
            target.price_level = v;
        }
        if let Some(v) = &self.level_type {
            target.level_type.clone_from(v);
        }
        if let Some(v) = self.value_excl {
            target.value_excl = v;
        }
        if let Some(v) = self.value_incl {
            target.value_incl = v;
        }
        if let Some(v) = &self.comments {
            target.comments.clone_from(v);
        }
        if let Some(v) = self.valid_start {
            target.valid_start = v;
        }
        if let Some(v) = self.valid_end {
            target.valid_end = v;
        }
    }
}

/// The current row per price-level category, in first-seen category order.
///
/// A row replaces the current pick only when its effective timestamp is
/// strictly newer, so ties keep the earlier row. A timestamped row always
/// beats one with no timestamps.
#[must_use]
pub fn latest_price_levels(levels: &[PriceLevel]) -> Vec<&PriceLevel> {
    let mut latest: Vec<&PriceLevel> = Vec::new();
    for level in levels {
        let kind = level.details.price_level;
        match latest.iter_mut().find(|l| l.details.price_level == kind) {
            Some(current) => {
                if level.effective_timestamp() > current.effective_timestamp() {
                    *current = level;
                }
            }
            None => latest.push(level),
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap())
    }

    fn level(
        id: i64,
        kind: PriceLevelKind,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> PriceLevel {
        PriceLevel {
            id,
            details: NewPriceLevel {
                product_id: 1,
                price_level: kind,
                level_type: "Standard".to_string(),
                value_excl: Decimal::ONE_HUNDRED,
                value_incl: None,
                comments: None,
                valid_start: None,
                valid_end: None,
            },
            created_at,
            updated_at,
        }
    }

    fn ids(levels: &[&PriceLevel]) -> Vec<i64> {
        levels.iter().map(|l| l.id).collect()
    }

    #[test]
    fn picks_newest_per_kind_in_first_seen_order() {
        let levels = vec![
            level(1, PriceLevelKind::Rrp, at(1), None),
            level(2, PriceLevelKind::Trade, at(1), None),
            level(3, PriceLevelKind::Rrp, at(1), at(5)),
            level(4, PriceLevelKind::Trade, at(2), None),
        ];
        assert_eq!(ids(&latest_price_levels(&levels)), vec![3, 4]);
    }

    #[test]
    fn updated_at_takes_precedence_over_created_at() {
        let levels = vec![
            level(1, PriceLevelKind::Go, at(10), None),
            level(2, PriceLevelKind::Go, at(1), at(11)),
        ];
        assert_eq!(ids(&latest_price_levels(&levels)), vec![2]);
    }

    #[test]
    fn ties_keep_first_seen() {
        let levels = vec![
            level(1, PriceLevelKind::Mwp, at(3), None),
            level(2, PriceLevelKind::Mwp, at(3), None),
        ];
        assert_eq!(ids(&latest_price_levels(&levels)), vec![1]);
    }

    #[test]
    fn timestamped_row_beats_untimestamped() {
        let levels = vec![
            level(1, PriceLevelKind::Trade, None, None),
            level(2, PriceLevelKind::Trade, at(1), None),
        ];
        assert_eq!(ids(&latest_price_levels(&levels)), vec![2]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(latest_price_levels(&[]).is_empty());
    }

    #[test]
    fn kind_serializes_upper_case_labels() {
        assert_eq!(serde_json::to_value(PriceLevelKind::Rrp).unwrap(), "RRP");
        assert_eq!(serde_json::to_value(PriceLevelKind::Trade).unwrap(), "Trade");
        assert_eq!(PriceLevelKind::parse("mwp"), Ok(PriceLevelKind::Mwp));
    }
}
