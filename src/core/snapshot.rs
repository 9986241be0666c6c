use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::types::{
    CashFlowItem, CashFlowKind, ClientProfile, EQUITY_CATEGORY, FinancialSnapshot, Frequency,
};

pub const DEFAULT_AGE: u32 = 30;

pub fn monthly_equivalent(item: &CashFlowItem) -> f64 {
    match item.frequency {
        Frequency::Monthly => item.amount,
        Frequency::Annual => item.amount / 12.0,
    }
}

pub fn holdings_value(profile: &ClientProfile) -> f64 {
    profile
        .holdings
        .iter()
        .map(|h| h.shares * h.current_price)
        .sum()
}

pub fn total_assets(profile: &ClientProfile) -> f64 {
    let manual: f64 = profile.assets.iter().map(|a| a.value).sum();
    manual + holdings_value(profile)
}

pub fn total_liabilities(profile: &ClientProfile) -> f64 {
    profile.liabilities.iter().map(|l| l.amount).sum()
}

fn monthly_total(profile: &ClientProfile, kind: CashFlowKind) -> f64 {
    profile
        .cash_flows
        .iter()
        .filter(|item| item.kind == kind)
        .map(monthly_equivalent)
        .sum()
}

pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> u32 {
    let mut years = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

pub fn aggregate_snapshot(profile: &ClientProfile, as_of: NaiveDate) -> FinancialSnapshot {
    let (current_age, birth_year) = match profile.date_of_birth {
        Some(dob) => (age_on(dob, as_of), dob.year()),
        None => (DEFAULT_AGE, as_of.year() - DEFAULT_AGE as i32),
    };

    FinancialSnapshot {
        total_assets: total_assets(profile),
        total_liabilities: total_liabilities(profile),
        monthly_income: monthly_total(profile, CashFlowKind::Income),
        monthly_expense: monthly_total(profile, CashFlowKind::Expense),
        current_age,
        birth_year,
    }
}

// Holdings are merged into the equity bucket.
pub fn category_breakdown(profile: &ClientProfile) -> BTreeMap<String, f64> {
    let mut breakdown = BTreeMap::new();
    for asset in &profile.assets {
        *breakdown.entry(asset.category.clone()).or_insert(0.0) += asset.value;
    }
    let holdings = holdings_value(profile);
    if holdings != 0.0 {
        *breakdown.entry(EQUITY_CATEGORY.to_string()).or_insert(0.0) += holdings;
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AssetEntry, Holding, Liability};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn cash_flow(kind: CashFlowKind, amount: f64, frequency: Frequency) -> CashFlowItem {
        CashFlowItem {
            id: String::new(),
            name: "item".to_string(),
            kind,
            amount,
            frequency,
        }
    }

    fn sample_profile() -> ClientProfile {
        ClientProfile {
            id: "c1".to_string(),
            name: "Sample".to_string(),
            date_of_birth: Some(date(1980, 6, 15)),
            assets: vec![
                AssetEntry {
                    id: "a1".to_string(),
                    name: "Flat".to_string(),
                    category: "Property".to_string(),
                    value: 5_000_000.0,
                },
                AssetEntry {
                    id: "a2".to_string(),
                    name: "Index fund".to_string(),
                    category: EQUITY_CATEGORY.to_string(),
                    value: 200_000.0,
                },
            ],
            liabilities: vec![Liability {
                id: "l1".to_string(),
                name: "Mortgage".to_string(),
                amount: 1_500_000.0,
            }],
            cash_flows: vec![
                cash_flow(CashFlowKind::Income, 60_000.0, Frequency::Monthly),
                cash_flow(CashFlowKind::Income, 120_000.0, Frequency::Annual),
                cash_flow(CashFlowKind::Expense, 30_000.0, Frequency::Monthly),
            ],
            holdings: vec![
                Holding {
                    symbol: "0700".to_string(),
                    shares: 100.0,
                    current_price: 350.0,
                },
                Holding {
                    symbol: "0005".to_string(),
                    shares: 400.0,
                    current_price: 60.0,
                },
            ],
            smart_assets: Vec::new(),
        }
    }

    #[test]
    fn annual_items_contribute_a_twelfth() {
        let item = cash_flow(CashFlowKind::Income, 120_000.0, Frequency::Annual);
        assert_approx(monthly_equivalent(&item), 10_000.0);
        let item = cash_flow(CashFlowKind::Income, 5_000.0, Frequency::Monthly);
        assert_approx(monthly_equivalent(&item), 5_000.0);
    }

    #[test]
    fn unknown_frequency_deserializes_as_annual() {
        let item: CashFlowItem = serde_json::from_str(
            r#"{"name":"bonus","kind":"income","amount":24000,"frequency":"quarterly"}"#,
        )
        .expect("item should parse");
        assert_eq!(item.frequency, Frequency::Annual);
        assert_approx(monthly_equivalent(&item), 2_000.0);
    }

    #[test]
    fn snapshot_sums_assets_holdings_and_cash_flow() {
        let snapshot = aggregate_snapshot(&sample_profile(), date(2025, 1, 1));
        assert_approx(snapshot.total_assets, 5_200_000.0 + 35_000.0 + 24_000.0);
        assert_approx(snapshot.total_liabilities, 1_500_000.0);
        assert_approx(snapshot.monthly_income, 70_000.0);
        assert_approx(snapshot.monthly_expense, 30_000.0);
        assert_approx(snapshot.monthly_savings(), 40_000.0);
        assert_eq!(snapshot.current_age, 44);
        assert_eq!(snapshot.birth_year, 1980);
    }

    #[test]
    fn age_respects_birthday_not_yet_reached() {
        let dob = date(1980, 6, 15);
        assert_eq!(age_on(dob, date(2025, 6, 14)), 44);
        assert_eq!(age_on(dob, date(2025, 6, 15)), 45);
        assert_eq!(age_on(dob, date(1979, 1, 1)), 0);
    }

    #[test]
    fn missing_date_of_birth_uses_default_age() {
        let mut profile = sample_profile();
        profile.date_of_birth = None;
        let snapshot = aggregate_snapshot(&profile, date(2025, 3, 1));
        assert_eq!(snapshot.current_age, DEFAULT_AGE);
        assert_eq!(snapshot.birth_year, 1995);
    }

    #[test]
    fn deficit_clamps_default_savings_and_negative_net_worth_is_valid() {
        let mut profile = sample_profile();
        profile
            .cash_flows
            .push(cash_flow(CashFlowKind::Expense, 100_000.0, Frequency::Monthly));
        profile.liabilities[0].amount = 10_000_000.0;
        let snapshot = aggregate_snapshot(&profile, date(2025, 1, 1));
        assert_approx(snapshot.monthly_savings(), 0.0);
        assert!(snapshot.net_worth() < 0.0);
    }

    #[test]
    fn breakdown_merges_holdings_into_equity_without_double_counting() {
        let profile = sample_profile();
        let breakdown = category_breakdown(&profile);
        assert_approx(breakdown["Property"], 5_000_000.0);
        assert_approx(breakdown[EQUITY_CATEGORY], 200_000.0 + 59_000.0);
        assert_eq!(breakdown.len(), 2);
        let sum: f64 = breakdown.values().sum();
        assert_approx(sum, total_assets(&profile));
    }
}
