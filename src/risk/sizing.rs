//! Order volume and protective price levels

use crate::config::RiskConfig;
use crate::models::market::SymbolConstraints;
use crate::models::signal::Direction;
use crate::risk::error::RiskError;

const MAX_STEP_DECIMALS: i32 = 10;

/// Admissible order volume for a new position.
///
/// raw = equity * risk_fraction / price, clamped to the symbol's volume
/// range, then rounded to the nearest volume step (ties to even). A result
/// pushed outside the range by rounding moves back in by one step.
pub fn size(
    equity: f64,
    price: f64,
    constraints: &SymbolConstraints,
    risk: &RiskConfig,
) -> Result<f64, RiskError> {
    validate_constraints(constraints)?;

    if !equity.is_finite() || equity < 0.0 {
        return Err(RiskError::InvalidInput(format!("equity must be non-negative, got {}", equity)));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(RiskError::InvalidInput(format!("price must be positive, got {}", price)));
    }
    if !risk.risk_fraction.is_finite() || risk.risk_fraction <= 0.0 {
        return Err(RiskError::InvalidInput(format!(
            "risk fraction must be positive, got {}",
            risk.risk_fraction
        )));
    }

    let raw = equity * risk.risk_fraction / price;
    let clamped = raw.clamp(constraints.min_volume, constraints.max_volume);

    let step = constraints.volume_step;
    let mut volume = quantize(clamped, step);
    if volume < constraints.min_volume || volume <= 0.0 {
        volume = quantize(volume + step, step);
    }
    if volume > constraints.max_volume {
        volume = quantize(volume - step, step);
    }

    if !(volume > 0.0) || volume < constraints.min_volume || volume > constraints.max_volume {
        return Err(RiskError::InvalidConstraints(format!(
            "no multiple of step {} lies within [{}, {}]",
            step, constraints.min_volume, constraints.max_volume
        )));
    }
    Ok(volume)
}

/// Round `volume` to the nearest multiple of `step`, ties to even.
///
/// The result is trimmed to the step's decimal places so that, for example,
/// three steps of 0.1 come out as 0.3 rather than 0.30000000000000004.
pub fn quantize(volume: f64, step: f64) -> f64 {
    let steps = (volume / step).round_ties_even();
    let factor = 10f64.powi(step_decimals(step));
    (steps * step * factor).round() / factor
}

fn step_decimals(step: f64) -> i32 {
    let mut decimals = 0;
    let mut scaled = step;
    while decimals < MAX_STEP_DECIMALS && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

fn validate_constraints(constraints: &SymbolConstraints) -> Result<(), RiskError> {
    let SymbolConstraints {
        min_volume,
        max_volume,
        volume_step,
        ..
    } = *constraints;

    if !(volume_step > 0.0) || !volume_step.is_finite() {
        return Err(RiskError::InvalidConstraints(format!(
            "volume step must be positive, got {}",
            volume_step
        )));
    }
    if !min_volume.is_finite() || !max_volume.is_finite() || min_volume > max_volume {
        return Err(RiskError::InvalidConstraints(format!(
            "minimum volume {} exceeds maximum volume {}",
            min_volume, max_volume
        )));
    }
    if min_volume < 0.0 {
        return Err(RiskError::InvalidConstraints(format!(
            "minimum volume must not be negative, got {}",
            min_volume
        )));
    }
    Ok(())
}

/// Stop-loss and take-profit prices for a new position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectiveLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Levels placed `volatility * factor` away from `price`: below/above for a
/// LONG, above/below for a SHORT
pub fn protective_levels(
    direction: Direction,
    price: f64,
    volatility: f64,
    risk: &RiskConfig,
) -> ProtectiveLevels {
    let stop_distance = volatility * risk.stop_loss_factor;
    let profit_distance = volatility * risk.take_profit_factor;

    match direction {
        Direction::Long => ProtectiveLevels {
            stop_loss: price - stop_distance,
            take_profit: price + profit_distance,
        },
        Direction::Short => ProtectiveLevels {
            stop_loss: price + stop_distance,
            take_profit: price - profit_distance,
        },
    }
}
