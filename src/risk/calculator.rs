//! Risk sizing calculator: position size from acceptable loss.
//!
//! Given portfolio value, entry/stop prices, and a risk percentage, derives
//! the capital at risk, the stop distance, the recommended position size,
//! and a collateral table across fixed leverage tiers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::models::PositionSide;

/// Leverage tiers offered in the collateral table.
pub const LEVERAGE_TIERS: [u32; 8] = [1, 2, 3, 5, 10, 20, 50, 100];

/// Inputs to a sizing calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Total portfolio value in account currency
    pub portfolio_value: Decimal,

    /// Planned entry price
    pub entry_price: Decimal,

    /// Price at which the position is exited at a loss
    pub stop_loss: Decimal,

    /// Percentage of the portfolio to put at risk (0 exclusive to 100)
    pub risk_percentage: Decimal,

    /// Position direction; decides which side the stop must sit on
    pub position: PositionSide,
}

/// One row of the leverage/collateral table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageSuggestion {
    pub leverage: u32,

    /// Recommended position size (same across rows)
    pub position_size: Decimal,

    /// Margin required at this leverage
    pub collateral: Decimal,

    /// Cash actually committed to the position; equals the collateral
    pub real_investment: Decimal,
}

impl LeverageSuggestion {
    /// Fraction of the portfolio committed at this tier. Guarded: a zero
    /// portfolio yields zero rather than propagating a division by zero.
    pub fn portfolio_share(&self, portfolio_value: Decimal) -> Decimal {
        if portfolio_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.real_investment / portfolio_value
    }

    pub fn band(&self, portfolio_value: Decimal) -> ExposureBand {
        ExposureBand::classify(self.portfolio_share(portfolio_value))
    }
}

/// Presentation band for a portfolio share. Display only, no business
/// decisions hang off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureBand {
    Conservative,
    Moderate,
    Elevated,
    Aggressive,
}

impl ExposureBand {
    pub fn classify(share: Decimal) -> Self {
        if share <= dec!(0.02) {
            ExposureBand::Conservative
        } else if share <= dec!(0.05) {
            ExposureBand::Moderate
        } else if share < dec!(0.20) {
            ExposureBand::Elevated
        } else {
            ExposureBand::Aggressive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureBand::Conservative => "conservative",
            ExposureBand::Moderate => "moderate",
            ExposureBand::Elevated => "elevated",
            ExposureBand::Aggressive => "aggressive",
        }
    }
}

/// Result of a sizing calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCalculation {
    /// The inputs the calculation was run with
    pub inputs: RiskInputs,

    /// Recommended position size in account currency
    pub position_size: Decimal,

    /// Capital at risk if the stop is hit
    pub risk_amount: Decimal,

    /// Distance between entry and stop, always positive
    pub stop_loss_points: Decimal,

    /// Collateral table across `LEVERAGE_TIERS`
    pub leverage_suggestions: Vec<LeverageSuggestion>,
}

impl RiskCalculation {
    /// Stop distance as a percentage of the entry price.
    pub fn stop_distance_pct(&self) -> Decimal {
        if self.inputs.entry_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.stop_loss_points / self.inputs.entry_price * dec!(100)
    }
}

impl std::fmt::Display for RiskCalculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Risk amount:       ${:.2}", self.risk_amount)?;
        writeln!(
            f,
            "Stop loss points:  {:.2} ({:.2}%)",
            self.stop_loss_points,
            self.stop_distance_pct()
        )?;
        writeln!(f, "Position size:     ${:.2}", self.position_size)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>10} {:>14} {:>14} {:>12}  {}",
            "LEVERAGE", "POSITION", "INVESTMENT", "SHARE", "BAND"
        )?;
        for row in &self.leverage_suggestions {
            let share = row.portfolio_share(self.inputs.portfolio_value);
            writeln!(
                f,
                "{:>9}x {:>14.2} {:>14.2} {:>11.2}%  {}",
                row.leverage,
                row.position_size,
                row.real_investment,
                share * dec!(100),
                row.band(self.inputs.portfolio_value).as_str()
            )?;
        }
        Ok(())
    }
}

/// Calculator for position sizing from acceptable loss.
pub struct RiskCalculator;

impl RiskCalculator {
    /// Run a sizing calculation. Fails with `InvalidInput` and a
    /// human-readable reason before computing anything when an input is
    /// out of range or the stop sits on the wrong side of the entry.
    pub fn calculate(inputs: RiskInputs) -> Result<RiskCalculation, Error> {
        Self::validate(&inputs)?;

        let risk_amount = inputs.portfolio_value * inputs.risk_percentage / dec!(100);

        // Positive on both sides given the validation above
        let stop_loss_points = match inputs.position {
            PositionSide::Long => inputs.entry_price - inputs.stop_loss,
            PositionSide::Short => inputs.stop_loss - inputs.entry_price,
        };

        let position_size = risk_amount / (stop_loss_points / inputs.entry_price);

        let leverage_suggestions = LEVERAGE_TIERS
            .iter()
            .map(|&leverage| {
                let collateral = position_size / Decimal::from(leverage);
                LeverageSuggestion {
                    leverage,
                    position_size,
                    collateral,
                    real_investment: collateral,
                }
            })
            .collect();

        Ok(RiskCalculation {
            inputs,
            position_size,
            risk_amount,
            stop_loss_points,
            leverage_suggestions,
        })
    }

    fn validate(inputs: &RiskInputs) -> Result<(), Error> {
        if inputs.portfolio_value <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "portfolio value must be greater than 0".to_string(),
            ));
        }

        if inputs.entry_price <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "entry price must be greater than 0".to_string(),
            ));
        }

        if inputs.stop_loss <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "stop loss must be greater than 0".to_string(),
            ));
        }

        if inputs.risk_percentage <= Decimal::ZERO || inputs.risk_percentage > dec!(100) {
            return Err(Error::InvalidInput(
                "risk percentage must be between 0 and 100".to_string(),
            ));
        }

        match inputs.position {
            PositionSide::Long if inputs.entry_price <= inputs.stop_loss => {
                Err(Error::InvalidInput(
                    "for a long position the stop loss must be below the entry price".to_string(),
                ))
            }
            PositionSide::Short if inputs.entry_price >= inputs.stop_loss => {
                Err(Error::InvalidInput(
                    "for a short position the stop loss must be above the entry price".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(position: PositionSide, entry: Decimal, stop: Decimal) -> RiskInputs {
        RiskInputs {
            portfolio_value: dec!(10000),
            entry_price: entry,
            stop_loss: stop,
            risk_percentage: dec!(1),
            position,
        }
    }

    #[test]
    fn test_long_sizing_example() {
        let calc =
            RiskCalculator::calculate(inputs(PositionSide::Long, dec!(100), dec!(95))).unwrap();

        assert_eq!(calc.risk_amount, dec!(100));
        assert_eq!(calc.stop_loss_points, dec!(5));
        // 100 / (5 / 100) = 2000
        assert_eq!(calc.position_size, dec!(2000));
        assert_eq!(calc.stop_distance_pct(), dec!(5));
    }

    #[test]
    fn test_short_sizing_mirrors_long() {
        let calc =
            RiskCalculator::calculate(inputs(PositionSide::Short, dec!(95), dec!(100))).unwrap();

        assert_eq!(calc.stop_loss_points, dec!(5));
        assert!(calc.position_size > Decimal::ZERO);
    }

    #[test]
    fn test_long_rejects_stop_above_entry() {
        let err =
            RiskCalculator::calculate(inputs(PositionSide::Long, dec!(95), dec!(100))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_short_rejects_stop_below_entry() {
        let err =
            RiskCalculator::calculate(inputs(PositionSide::Short, dec!(100), dec!(95))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_input_bounds() {
        let mut bad = inputs(PositionSide::Long, dec!(100), dec!(95));
        bad.portfolio_value = dec!(0);
        assert!(RiskCalculator::calculate(bad).is_err());

        let mut bad = inputs(PositionSide::Long, dec!(100), dec!(95));
        bad.risk_percentage = dec!(101);
        assert!(RiskCalculator::calculate(bad).is_err());

        let mut bad = inputs(PositionSide::Long, dec!(100), dec!(95));
        bad.risk_percentage = dec!(0);
        assert!(RiskCalculator::calculate(bad).is_err());

        // 100% risk is the inclusive upper bound
        let mut edge = inputs(PositionSide::Long, dec!(100), dec!(95));
        edge.risk_percentage = dec!(100);
        assert!(RiskCalculator::calculate(edge).is_ok());
    }

    #[test]
    fn test_leverage_table() {
        let calc =
            RiskCalculator::calculate(inputs(PositionSide::Long, dec!(100), dec!(95))).unwrap();

        assert_eq!(calc.leverage_suggestions.len(), LEVERAGE_TIERS.len());

        let ten_x = calc
            .leverage_suggestions
            .iter()
            .find(|s| s.leverage == 10)
            .unwrap();

        // 2000 / 10 = 200, collateral and real investment agree
        assert_eq!(ten_x.collateral, dec!(200));
        assert_eq!(ten_x.real_investment, dec!(200));

        // 200 / 10000 = 2% of the portfolio
        assert_eq!(ten_x.portfolio_share(dec!(10000)), dec!(0.02));
        assert_eq!(ten_x.band(dec!(10000)), ExposureBand::Conservative);
    }

    #[test]
    fn test_portfolio_share_guards_zero_portfolio() {
        let suggestion = LeverageSuggestion {
            leverage: 1,
            position_size: dec!(2000),
            collateral: dec!(2000),
            real_investment: dec!(2000),
        };

        assert_eq!(suggestion.portfolio_share(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            suggestion.band(Decimal::ZERO),
            ExposureBand::Conservative
        );
    }

    #[test]
    fn test_exposure_bands() {
        assert_eq!(
            ExposureBand::classify(dec!(0.02)),
            ExposureBand::Conservative
        );
        assert_eq!(ExposureBand::classify(dec!(0.04)), ExposureBand::Moderate);
        assert_eq!(ExposureBand::classify(dec!(0.10)), ExposureBand::Elevated);
        assert_eq!(ExposureBand::classify(dec!(0.20)), ExposureBand::Aggressive);
        assert_eq!(ExposureBand::classify(dec!(0.75)), ExposureBand::Aggressive);
    }
}
