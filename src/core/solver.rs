use super::error::{ProjectionError, Result, check_age, check_finite, check_rate};
use super::types::{RetirementInputs, RetirementPlan};

pub const NEAR_ZERO_RATE: f64 = 1e-4;

pub fn future_monthly_income(
    desired_monthly_income_pv: f64,
    inflation_rate_pct: f64,
    years_to_retire: u32,
) -> f64 {
    desired_monthly_income_pv * (1.0 + inflation_rate_pct / 100.0).powi(years_to_retire as i32)
}

pub fn real_monthly_rate(post_retirement_return_pct: f64, inflation_rate_pct: f64) -> f64 {
    let real_annual =
        (1.0 + post_retirement_return_pct / 100.0) / (1.0 + inflation_rate_pct / 100.0) - 1.0;
    (1.0 + real_annual).powf(1.0 / 12.0) - 1.0
}

pub fn annuity_present_value(monthly_payment: f64, monthly_rate: f64, months: i64) -> Result<f64> {
    if months < 0 {
        return Err(ProjectionError::InvalidHorizon {
            name: "months",
            value: months,
        });
    }
    if monthly_rate.abs() < NEAR_ZERO_RATE {
        return Ok(monthly_payment * months as f64);
    }
    let discount = (1.0 + monthly_rate).powf(-(months as f64));
    Ok(monthly_payment * (1.0 - discount) / monthly_rate)
}

// One unit credited at each year end, matching the simulator's contributions.
pub fn annual_annuity_factor(annual_rate_pct: f64, years: i64) -> Result<f64> {
    if years < 0 {
        return Err(ProjectionError::InvalidHorizon {
            name: "years",
            value: years,
        });
    }
    let rate = annual_rate_pct / 100.0;
    if rate.abs() < NEAR_ZERO_RATE {
        return Ok(years as f64);
    }
    Ok(((1.0 + rate).powi(years as i32) - 1.0) / rate)
}

pub fn plan_retirement(inputs: &RetirementInputs) -> Result<RetirementPlan> {
    validate_inputs(inputs)?;

    let years_to_retire = inputs
        .target_retirement_age
        .saturating_sub(inputs.current_age);
    let years_in_retirement = inputs
        .life_expectancy
        .saturating_sub(inputs.target_retirement_age);

    let monthly_income = future_monthly_income(
        inputs.desired_monthly_income_pv,
        inputs.inflation_rate_pct,
        years_to_retire,
    );
    let monthly_rate =
        real_monthly_rate(inputs.post_retirement_return_pct, inputs.inflation_rate_pct);
    let required_corpus = annuity_present_value(
        monthly_income,
        monthly_rate,
        i64::from(years_in_retirement) * 12,
    )?;

    let growth = (1.0 + inputs.pre_retirement_return_pct / 100.0).powi(years_to_retire as i32);
    let factor =
        annual_annuity_factor(inputs.pre_retirement_return_pct, i64::from(years_to_retire))?;
    let projected_corpus =
        inputs.current_investable_assets * growth + inputs.monthly_contribution * 12.0 * factor;
    let shortfall = required_corpus - projected_corpus;

    let (required_monthly_savings, goal_reachable) = if shortfall <= 0.0 {
        (0.0, true)
    } else if factor <= 0.0 {
        (0.0, false)
    } else {
        (shortfall / (12.0 * factor), true)
    };

    log::debug!(
        "retirement plan: {years_to_retire} years to retire, {years_in_retirement} in retirement, shortfall {shortfall:.2}"
    );

    Ok(RetirementPlan {
        years_to_retire,
        years_in_retirement,
        future_monthly_income: monthly_income.round(),
        required_corpus: required_corpus.round(),
        projected_corpus: projected_corpus.round(),
        shortfall: shortfall.round(),
        surplus: (-shortfall).max(0.0).round(),
        required_monthly_savings: required_monthly_savings.round(),
        goal_reachable,
    })
}

fn validate_inputs(inputs: &RetirementInputs) -> Result<()> {
    check_age("currentAge", inputs.current_age)?;
    check_age("targetRetirementAge", inputs.target_retirement_age)?;
    check_age("lifeExpectancy", inputs.life_expectancy)?;
    check_finite("desiredMonthlyIncomePv", inputs.desired_monthly_income_pv)?;
    check_finite("currentInvestableAssets", inputs.current_investable_assets)?;
    check_finite("monthlyContribution", inputs.monthly_contribution)?;
    check_rate("inflationRatePct", inputs.inflation_rate_pct)?;
    check_rate("preRetirementReturnPct", inputs.pre_retirement_return_pct)?;
    check_rate("postRetirementReturnPct", inputs.post_retirement_return_pct)?;
    Ok(())
}
