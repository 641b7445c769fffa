//! GST-aware margin math.
//!
//! Cost and sell price, both exclusive of tax, are the only independent
//! variables. Margin, markup and gross profit are always derived from that
//! pair and never stored. All arithmetic is checked `Decimal` arithmetic;
//! rounding to two places happens only when a [`MarginBreakdown`] is built.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::price_levels::{latest_price_levels, PriceLevel, PriceLevelKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("tax rate must be in [0, 100), got {0}")]
    InvalidTaxRate(Decimal),

    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error("{field} requires a cost price greater than zero")]
    CostRequired { field: &'static str },

    #[error("gross margin must be in [0, 100), got {0}")]
    MarginOutOfRange(Decimal),

    #[error("{field} is too large to compute")]
    Overflow { field: &'static str },
}

impl PricingError {
    /// The request field the error should be reported against.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidTaxRate(_) => "tax_rate",
            Self::MarginOutOfRange(_) => "gross_margin",
            Self::NegativeAmount { field }
            | Self::CostRequired { field }
            | Self::Overflow { field } => field,
        }
    }
}

/// A GST percentage in `[0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidTaxRate`] outside `[0, 100)`.
    pub fn new(percent: Decimal) -> Result<Self, PricingError> {
        if percent < Decimal::ZERO || percent >= Decimal::ONE_HUNDRED {
            return Err(PricingError::InvalidTaxRate(percent));
        }
        Ok(Self(percent))
    }

    #[must_use]
    pub fn percent(self) -> Decimal {
        self.0
    }

    /// `1 + rate / 100`.
    #[must_use]
    pub fn factor(self) -> Decimal {
        Decimal::ONE + self.0 / Decimal::ONE_HUNDRED
    }

    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the result does not fit a `Decimal`.
    pub fn to_exclusive(self, incl: Decimal) -> Result<Decimal, PricingError> {
        incl.checked_div(self.factor())
            .ok_or(PricingError::Overflow { field: "price" })
    }

    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the result does not fit a `Decimal`.
    pub fn to_inclusive(self, excl: Decimal) -> Result<Decimal, PricingError> {
        excl.checked_mul(self.factor())
            .ok_or(PricingError::Overflow { field: "price" })
    }
}

/// Round to cents, halves toward positive infinity.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(2, strategy)
}

/// `(sell - cost) / sell * 100`, or zero when `sell <= 0`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] for extreme ratios.
pub fn gross_margin_pct(sell_excl: Decimal, cost_excl: Decimal) -> Result<Decimal, PricingError> {
    if sell_excl <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    percent_of(sell_excl - cost_excl, sell_excl, "gross_margin")
}

/// `(sell - cost) / cost * 100`, or zero when `cost <= 0`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] for extreme ratios.
pub fn markup_pct(sell_excl: Decimal, cost_excl: Decimal) -> Result<Decimal, PricingError> {
    if cost_excl <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    percent_of(sell_excl - cost_excl, cost_excl, "markup")
}

fn percent_of(
    numerator: Decimal,
    denominator: Decimal,
    field: &'static str,
) -> Result<Decimal, PricingError> {
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(PricingError::Overflow { field })
}

fn non_negative(value: Decimal, field: &'static str) -> Result<Decimal, PricingError> {
    if value < Decimal::ZERO {
        Err(PricingError::NegativeAmount { field })
    } else {
        Ok(value)
    }
}

/// One edited figure; every other figure is re-derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MarginEdit {
    SellPriceIncl(Decimal),
    SellPriceExcl(Decimal),
    CostPriceExcl(Decimal),
    CostPriceIncl(Decimal),
    GrossMargin(Decimal),
    Markup(Decimal),
    GrossProfit(Decimal),
}

/// A margin calculator request: the starting prices, the tax treatment of
/// those prices and an optional edit to apply on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginRequest {
    pub tax_rate: Option<Decimal>,
    pub prices_include_tax: bool,
    pub sell_price: Decimal,
    pub cost_price: Decimal,
    pub edit: Option<MarginEdit>,
}

/// The closed system of sell price, cost price, margin, markup and profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginCalculator {
    tax_rate: TaxRate,
    sell_excl: Decimal,
    cost_excl: Decimal,
}

impl MarginCalculator {
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeAmount`] for negative prices.
    pub fn from_exclusive(
        tax_rate: TaxRate,
        sell_excl: Decimal,
        cost_excl: Decimal,
    ) -> Result<Self, PricingError> {
        Ok(Self {
            tax_rate,
            sell_excl: non_negative(sell_excl, "sell_price")?,
            cost_excl: non_negative(cost_excl, "cost_price")?,
        })
    }

    /// # Errors
    ///
    /// Returns [`PricingError::NegativeAmount`] for negative prices.
    pub fn from_inclusive(
        tax_rate: TaxRate,
        sell_incl: Decimal,
        cost_incl: Decimal,
    ) -> Result<Self, PricingError> {
        let sell_incl = non_negative(sell_incl, "sell_price")?;
        let cost_incl = non_negative(cost_incl, "cost_price")?;
        Ok(Self {
            tax_rate,
            sell_excl: tax_rate.to_exclusive(sell_incl)?,
            cost_excl: tax_rate.to_exclusive(cost_incl)?,
        })
    }

    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    #[must_use]
    pub fn sell_excl(&self) -> Decimal {
        self.sell_excl
    }

    #[must_use]
    pub fn cost_excl(&self) -> Decimal {
        self.cost_excl
    }

    /// Unrounded gross margin percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] for extreme ratios.
    pub fn gross_margin_pct(&self) -> Result<Decimal, PricingError> {
        gross_margin_pct(self.sell_excl, self.cost_excl)
    }

    /// Unrounded markup percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] for extreme ratios.
    pub fn markup_pct(&self) -> Result<Decimal, PricingError> {
        markup_pct(self.sell_excl, self.cost_excl)
    }

    #[must_use]
    pub fn gross_profit(&self) -> Decimal {
        self.sell_excl - self.cost_excl
    }

    /// Apply one edit and return the re-derived calculator.
    ///
    /// Margin, markup and profit edits move the sell price and keep cost.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when the edit cannot produce a valid
    /// non-negative price pair; `self` is unchanged.
    pub fn apply(self, edit: MarginEdit) -> Result<Self, PricingError> {
        let tax = self.tax_rate;
        let cost = self.cost_excl;
        let mut next = self;
        match edit {
            MarginEdit::SellPriceIncl(v) => {
                next.sell_excl = tax.to_exclusive(non_negative(v, "sell_price_incl")?)?;
            }
            MarginEdit::SellPriceExcl(v) => {
                next.sell_excl = non_negative(v, "sell_price_excl")?;
            }
            MarginEdit::CostPriceExcl(v) => {
                next.cost_excl = non_negative(v, "cost_price_excl")?;
            }
            MarginEdit::CostPriceIncl(v) => {
                next.cost_excl = tax.to_exclusive(non_negative(v, "cost_price_incl")?)?;
            }
            MarginEdit::GrossMargin(m) => {
                if cost <= Decimal::ZERO {
                    return Err(PricingError::CostRequired {
                        field: "gross_margin",
                    });
                }
                if m < Decimal::ZERO || m >= Decimal::ONE_HUNDRED {
                    return Err(PricingError::MarginOutOfRange(m));
                }
                let keep = Decimal::ONE - m / Decimal::ONE_HUNDRED;
                next.sell_excl = cost.checked_div(keep).ok_or(PricingError::Overflow {
                    field: "gross_margin",
                })?;
            }
            MarginEdit::Markup(mu) => {
                if cost <= Decimal::ZERO {
                    return Err(PricingError::CostRequired { field: "markup" });
                }
                let mu = non_negative(mu, "markup")?;
                next.sell_excl = (mu / Decimal::ONE_HUNDRED)
                    .checked_add(Decimal::ONE)
                    .and_then(|factor| cost.checked_mul(factor))
                    .ok_or(PricingError::Overflow { field: "markup" })?;
            }
            MarginEdit::GrossProfit(p) => {
                let sell = cost
                    .checked_add(p)
                    .ok_or(PricingError::Overflow {
                        field: "gross_profit",
                    })?;
                next.sell_excl = non_negative(sell, "gross_profit")?;
            }
        }
        Ok(next)
    }

    /// Rounded, display-ready figures.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if a derived figure does not fit.
    pub fn breakdown(&self) -> Result<MarginBreakdown, PricingError> {
        Ok(MarginBreakdown {
            tax_rate: self.tax_rate.percent(),
            sell_price_incl: round_money(self.tax_rate.to_inclusive(self.sell_excl)?),
            sell_price_excl: round_money(self.sell_excl),
            cost_price_incl: round_money(self.tax_rate.to_inclusive(self.cost_excl)?),
            cost_price_excl: round_money(self.cost_excl),
            gross_margin_pct: round_money(self.gross_margin_pct()?),
            markup_pct: round_money(self.markup_pct()?),
            gross_profit: round_money(self.gross_profit()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBreakdown {
    pub tax_rate: Decimal,
    pub sell_price_incl: Decimal,
    pub sell_price_excl: Decimal,
    pub cost_price_incl: Decimal,
    pub cost_price_excl: Decimal,
    pub gross_margin_pct: Decimal,
    pub markup_pct: Decimal,
    pub gross_profit: Decimal,
}

/// Current price levels for one product and the margins between them.
///
/// Each breakdown treats Trade as cost and the named level as sell price,
/// both tax-inclusive; it is `None` when either level is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPricing {
    pub tax_rate: Decimal,
    pub latest: Vec<PriceLevel>,
    pub franchise: Option<MarginBreakdown>,
    pub mwp: Option<MarginBreakdown>,
    pub go: Option<MarginBreakdown>,
}

impl ProductPricing {
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a stored value cannot be converted.
    pub fn from_levels(levels: &[PriceLevel], tax_rate: TaxRate) -> Result<Self, PricingError> {
        let latest = latest_price_levels(levels);
        let inclusive = |kind: PriceLevelKind| -> Result<Option<Decimal>, PricingError> {
            latest
                .iter()
                .find(|l| l.details.price_level == kind)
                .map(|l| match l.details.value_incl {
                    Some(incl) => Ok(incl),
                    None => tax_rate.to_inclusive(l.details.value_excl),
                })
                .transpose()
        };

        let trade = inclusive(PriceLevelKind::Trade)?;
        let against_trade = |kind: PriceLevelKind| -> Result<Option<MarginBreakdown>, PricingError> {
            match (inclusive(kind)?, trade) {
                (Some(sell), Some(cost)) => {
                    MarginCalculator::from_inclusive(tax_rate, sell, cost)?
                        .breakdown()
                        .map(Some)
                }
                _ => Ok(None),
            }
        };

        let franchise = against_trade(PriceLevelKind::Rrp)?;
        let mwp = against_trade(PriceLevelKind::Mwp)?;
        let go = against_trade(PriceLevelKind::Go)?;

        Ok(Self {
            tax_rate: tax_rate.percent(),
            latest: latest.into_iter().cloned().collect(),
            franchise,
            mwp,
            go,
        })
    }
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
