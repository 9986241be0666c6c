use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const EQUITY_CATEGORY: &str = "Equity";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    // Anything that is not monthly is read as annual.
    #[serde(other)]
    Annual,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowKind {
    Income,
    Expense,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DividendMode {
    #[default]
    Independent,
    #[serde(alias = "netOfPayout", alias = "net_of_payout")]
    NetOfPayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub kind: CashFlowKind,
    pub amount: f64,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAsset {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub start_age: u32,
    pub initial_value: f64,
    pub growth_rate_pct: f64,
    #[serde(default)]
    pub dividend_rate_pct: f64,
    pub dividend_start_age: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientProfile {
    pub id: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub assets: Vec<AssetEntry>,
    pub liabilities: Vec<Liability>,
    pub cash_flows: Vec<CashFlowItem>,
    pub holdings: Vec<Holding>,
    pub smart_assets: Vec<SmartAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub current_age: u32,
    pub birth_year: i32,
}

impl FinancialSnapshot {
    pub fn net_worth(&self) -> f64 {
        self.total_assets - self.total_liabilities
    }

    pub fn monthly_savings(&self) -> f64 {
        (self.monthly_income - self.monthly_expense).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionAssumption {
    pub horizon_years: u32,
    pub inflation_rate_pct: f64,
    pub asset_growth_rate_pct: f64,
    pub new_money_return_rate_pct: f64,
    pub general_yield_rate_pct: f64,
    pub monthly_contribution: f64,
    #[serde(default)]
    pub dividend_mode: DividendMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: i32,
    pub age: u32,
    pub total_assets: f64,
    pub net_worth: f64,
    pub real_net_worth: f64,
    pub monthly_passive_income: f64,
    pub liabilities: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementInputs {
    pub current_age: u32,
    pub target_retirement_age: u32,
    pub life_expectancy: u32,
    pub desired_monthly_income_pv: f64,
    pub inflation_rate_pct: f64,
    pub pre_retirement_return_pct: f64,
    pub post_retirement_return_pct: f64,
    pub current_investable_assets: f64,
    pub monthly_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementPlan {
    pub years_to_retire: u32,
    pub years_in_retirement: u32,
    pub future_monthly_income: f64,
    pub required_corpus: f64,
    pub projected_corpus: f64,
    pub shortfall: f64,
    pub surplus: f64,
    pub required_monthly_savings: f64,
    pub goal_reachable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySummary {
    pub start_net_worth: f64,
    pub final_net_worth: f64,
    pub final_real_net_worth: f64,
    pub peak_net_worth: f64,
    pub peak_age: u32,
    pub final_monthly_passive_income: f64,
    pub fire_age: Option<u32>,
}
