mod engine;
mod error;
mod profile;
mod shaping;
mod snapshot;
mod solver;
mod types;

pub use engine::{LIABILITY_DECAY_FACTOR, simulate_projection};
pub use error::{MAX_AGE, ProjectionError, Result, check_age, check_horizon};
pub use profile::{ClientProfileRepository, InMemoryProfileRepository, RepositoryError};
pub use shaping::{round_points, round_snapshot, sample_points, summarize};
pub use snapshot::{
    DEFAULT_AGE, age_on, aggregate_snapshot, category_breakdown, monthly_equivalent,
};
pub use solver::{
    annual_annuity_factor, annuity_present_value, future_monthly_income, plan_retirement,
    real_monthly_rate,
};
pub use types::{
    AssetEntry, CashFlowItem, CashFlowKind, ClientProfile, DividendMode, EQUITY_CATEGORY,
    FinancialSnapshot, Frequency, Holding, Liability, ProjectionAssumption, ProjectionPoint,
    RetirementInputs, RetirementPlan, SmartAsset, TrajectorySummary,
};
