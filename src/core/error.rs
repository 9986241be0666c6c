use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("{name} must be > -100%, got {value}%")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("{name} must be >= 0, got {value}")]
    InvalidHorizon { name: &'static str, value: i64 },

    #[error("invalid {name}: {reason}")]
    InvalidInput { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

pub const MAX_AGE: u32 = 150;

// A rate of -100% or below makes the compounding factor non-positive.
pub(crate) fn check_rate(name: &'static str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if value <= -100.0 {
        return Err(ProjectionError::InvalidRate { name, value });
    }
    Ok(())
}

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ProjectionError::InvalidInput {
            name,
            reason: format!("must be a finite number, got {value}"),
        });
    }
    Ok(())
}

pub fn check_age(name: &'static str, value: u32) -> Result<()> {
    if value > MAX_AGE {
        return Err(ProjectionError::InvalidInput {
            name,
            reason: format!("must be <= {MAX_AGE}, got {value}"),
        });
    }
    Ok(())
}

pub fn check_horizon(name: &'static str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(ProjectionError::InvalidHorizon { name, value });
    }
    u32::try_from(value).map_err(|_| ProjectionError::InvalidInput {
        name,
        reason: format!("{value} is too large"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_of_minus_one_hundred_is_rejected() {
        let err = check_rate("assetGrowthRatePct", -100.0).expect_err("must reject");
        assert_eq!(
            err,
            ProjectionError::InvalidRate {
                name: "assetGrowthRatePct",
                value: -100.0
            }
        );
        assert!(err.to_string().contains("assetGrowthRatePct"));
    }

    #[test]
    fn negative_rates_above_minus_one_hundred_are_accepted() {
        assert!(check_rate("inflationRatePct", -99.9).is_ok());
        assert!(check_rate("inflationRatePct", 0.0).is_ok());
    }

    #[test]
    fn nan_rate_is_an_input_error() {
        let err = check_rate("generalYieldRatePct", f64::NAN).expect_err("must reject");
        assert!(matches!(err, ProjectionError::InvalidInput { .. }));
    }

    #[test]
    fn negative_horizon_is_rejected() {
        let err = check_horizon("horizonYears", -1).expect_err("must reject");
        assert!(matches!(err, ProjectionError::InvalidHorizon { value: -1, .. }));
        assert_eq!(check_horizon("horizonYears", 12), Ok(12));
    }

    #[test]
    fn ages_beyond_the_plausible_maximum_are_rejected() {
        assert!(check_age("currentAge", MAX_AGE).is_ok());
        let err = check_age("currentAge", u32::MAX).expect_err("must reject");
        assert!(matches!(err, ProjectionError::InvalidInput { name: "currentAge", .. }));
    }
}
