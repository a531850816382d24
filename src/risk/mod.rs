//! Risk sizing: position size from acceptable loss.

mod calculator;

pub use calculator::{
    ExposureBand, LeverageSuggestion, RiskCalculation, RiskCalculator, RiskInputs, LEVERAGE_TIERS,
};
