use super::error::{MAX_AGE, ProjectionError, Result, check_age, check_finite, check_rate};
use super::types::{
    DividendMode, FinancialSnapshot, ProjectionAssumption, ProjectionPoint, SmartAsset,
};

/// Yearly liability decay. Loan terms are not modelled; every liability is
/// assumed to shrink by 5% per simulated year.
pub const LIABILITY_DECAY_FACTOR: f64 = 0.95;

#[derive(Debug)]
struct Balances {
    base_assets: f64,
    accumulated_savings: f64,
    liabilities: f64,
}

impl Balances {
    fn invested(&self) -> f64 {
        self.base_assets + self.accumulated_savings
    }
}

#[derive(Debug)]
struct SmartAssetState<'a> {
    asset: &'a SmartAsset,
    active: bool,
    value: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SmartAssetYear {
    value: f64,
    passive_income: f64,
}

pub fn simulate_projection(
    snapshot: &FinancialSnapshot,
    assumption: &ProjectionAssumption,
    smart_assets: &[SmartAsset],
) -> Result<Vec<ProjectionPoint>> {
    validate_inputs(snapshot, assumption, smart_assets)?;

    let mut balances = Balances {
        base_assets: snapshot.total_assets,
        accumulated_savings: 0.0,
        liabilities: snapshot.total_liabilities,
    };
    let mut states: Vec<SmartAssetState<'_>> = smart_assets
        .iter()
        .map(|asset| SmartAssetState {
            asset,
            active: false,
            value: 0.0,
        })
        .collect();

    let mut points = Vec::with_capacity(assumption.horizon_years as usize + 1);
    for i in 0..=assumption.horizon_years {
        let age = snapshot.current_age + i;
        if i > 0 {
            apply_yearly_growth(assumption, &mut balances);
        }

        let mut smart = SmartAssetYear::default();
        for state in &mut states {
            let year = step_smart_asset(state, age, assumption.dividend_mode);
            smart.value += year.value;
            smart.passive_income += year.passive_income;
        }

        let total_assets = balances.invested() + smart.value;
        let annual_passive_income =
            balances.invested() * assumption.general_yield_rate_pct / 100.0 + smart.passive_income;
        let net_worth = total_assets - balances.liabilities;
        let deflator = (1.0 + assumption.inflation_rate_pct / 100.0).powi(i as i32);

        points.push(ProjectionPoint {
            year: snapshot.birth_year + age as i32,
            age,
            total_assets,
            net_worth,
            real_net_worth: net_worth / deflator,
            monthly_passive_income: annual_passive_income / 12.0,
            liabilities: balances.liabilities,
        });
    }

    log::debug!(
        "projected {} years from age {} with {} smart assets",
        assumption.horizon_years,
        snapshot.current_age,
        smart_assets.len()
    );
    Ok(points)
}

fn apply_yearly_growth(assumption: &ProjectionAssumption, balances: &mut Balances) {
    balances.base_assets *= 1.0 + assumption.asset_growth_rate_pct / 100.0;
    balances.accumulated_savings = balances.accumulated_savings
        * (1.0 + assumption.new_money_return_rate_pct / 100.0)
        + assumption.monthly_contribution * 12.0;
    balances.liabilities *= LIABILITY_DECAY_FACTOR;
}

fn step_smart_asset(
    state: &mut SmartAssetState<'_>,
    age: u32,
    mode: DividendMode,
) -> SmartAssetYear {
    let asset = state.asset;
    if !state.active {
        if age < asset.start_age {
            return SmartAssetYear::default();
        }
        state.active = true;
        state.value = asset.initial_value;
    } else {
        state.value *= 1.0 + asset.growth_rate_pct / 100.0;
    }

    let passive_income = if age >= asset.dividend_start_age {
        state.value * asset.dividend_rate_pct / 100.0
    } else {
        0.0
    };
    if mode == DividendMode::NetOfPayout {
        state.value -= passive_income;
    }

    SmartAssetYear {
        value: state.value,
        passive_income,
    }
}

fn validate_inputs(
    snapshot: &FinancialSnapshot,
    assumption: &ProjectionAssumption,
    smart_assets: &[SmartAsset],
) -> Result<()> {
    check_finite("totalAssets", snapshot.total_assets)?;
    check_finite("totalLiabilities", snapshot.total_liabilities)?;
    check_age("currentAge", snapshot.current_age)?;
    let final_age = snapshot
        .current_age
        .checked_add(assumption.horizon_years)
        .filter(|age| *age <= MAX_AGE)
        .ok_or_else(|| ProjectionError::InvalidInput {
            name: "horizonYears",
            reason: format!(
                "projection from age {} must end by age {MAX_AGE}",
                snapshot.current_age
            ),
        })?;
    if snapshot.birth_year.checked_add(final_age as i32).is_none() {
        return Err(ProjectionError::InvalidInput {
            name: "birthYear",
            reason: format!("{} overflows the calendar year", snapshot.birth_year),
        });
    }
    check_rate("inflationRatePct", assumption.inflation_rate_pct)?;
    check_rate("assetGrowthRatePct", assumption.asset_growth_rate_pct)?;
    check_rate("newMoneyReturnRatePct", assumption.new_money_return_rate_pct)?;
    check_rate("generalYieldRatePct", assumption.general_yield_rate_pct)?;
    check_finite("monthlyContribution", assumption.monthly_contribution)?;
    for asset in smart_assets {
        check_finite("smartAsset.initialValue", asset.initial_value)?;
        check_rate("smartAsset.growthRatePct", asset.growth_rate_pct)?;
        check_rate("smartAsset.dividendRatePct", asset.dividend_rate_pct)?;
    }
    Ok(())
}
