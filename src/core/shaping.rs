use super::error::{ProjectionError, Result};
use super::types::{FinancialSnapshot, ProjectionPoint, TrajectorySummary};

pub fn round_snapshot(snapshot: &FinancialSnapshot) -> FinancialSnapshot {
    FinancialSnapshot {
        total_assets: snapshot.total_assets.round(),
        total_liabilities: snapshot.total_liabilities.round(),
        monthly_income: snapshot.monthly_income.round(),
        monthly_expense: snapshot.monthly_expense.round(),
        ..*snapshot
    }
}

pub fn round_points(points: &[ProjectionPoint]) -> Vec<ProjectionPoint> {
    points
        .iter()
        .map(|p| ProjectionPoint {
            year: p.year,
            age: p.age,
            total_assets: p.total_assets.round(),
            net_worth: p.net_worth.round(),
            real_net_worth: p.real_net_worth.round(),
            monthly_passive_income: p.monthly_passive_income.round(),
            liabilities: p.liabilities.round(),
        })
        .collect()
}

// Keeps both ends of the trajectory.
pub fn sample_points(points: &[ProjectionPoint], max_points: usize) -> Result<Vec<ProjectionPoint>> {
    if max_points < 2 {
        return Err(ProjectionError::InvalidInput {
            name: "maxPoints",
            reason: format!("must be >= 2, got {max_points}"),
        });
    }
    if points.len() <= max_points {
        return Ok(points.to_vec());
    }

    let last = points.len() - 1;
    let step = last.div_ceil(max_points - 1);
    let mut sampled: Vec<ProjectionPoint> = points.iter().step_by(step).cloned().collect();
    if sampled.last().map(|p| p.age) != Some(points[last].age) {
        sampled.push(points[last].clone());
    }
    Ok(sampled)
}

pub fn summarize(points: &[ProjectionPoint], monthly_expense_target: f64) -> Option<TrajectorySummary> {
    let first = points.first()?;
    let last = points.last()?;
    let peak = points
        .iter()
        .max_by(|a, b| a.net_worth.total_cmp(&b.net_worth))?;
    let fire_age = if monthly_expense_target > 0.0 {
        points
            .iter()
            .find(|p| p.monthly_passive_income >= monthly_expense_target)
            .map(|p| p.age)
    } else {
        None
    };

    Some(TrajectorySummary {
        start_net_worth: first.net_worth.round(),
        final_net_worth: last.net_worth.round(),
        final_real_net_worth: last.real_net_worth.round(),
        peak_net_worth: peak.net_worth.round(),
        peak_age: peak.age,
        final_monthly_passive_income: last.monthly_passive_income.round(),
        fire_age,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(age: u32, net_worth: f64, passive: f64) -> ProjectionPoint {
        ProjectionPoint {
            year: 1990 + age as i32,
            age,
            total_assets: net_worth + 0.4,
            net_worth,
            real_net_worth: net_worth * 0.9,
            monthly_passive_income: passive,
            liabilities: 0.4,
        }
    }

    fn ramp(len: u32) -> Vec<ProjectionPoint> {
        (0..len)
            .map(|i| point(30 + i, 1_000.0 * i as f64, 10.0 * i as f64))
            .collect()
    }

    #[test]
    fn rounding_touches_money_only() {
        let rounded = round_points(&[point(40, 1_234.56, 99.5)]);
        let p = &rounded[0];
        assert_eq!(p.age, 40);
        assert_eq!(p.year, 2030);
        assert_eq!(p.net_worth, 1_235.0);
        assert_eq!(p.total_assets, 1_235.0);
        assert_eq!(p.monthly_passive_income, 100.0);
        assert_eq!(p.liabilities, 0.0);
    }

    #[test]
    fn sampling_keeps_first_and_last_point() {
        let points = ramp(31);
        let sampled = sample_points(&points, 7).expect("valid");
        assert!(sampled.len() <= 7);
        assert_eq!(sampled.first().map(|p| p.age), Some(30));
        assert_eq!(sampled.last().map(|p| p.age), Some(60));

        let sampled = sample_points(&ramp(12), 5).expect("valid");
        assert!(sampled.len() <= 5);
        assert_eq!(sampled.last().map(|p| p.age), Some(41));
    }

    #[test]
    fn short_trajectories_are_returned_whole() {
        let points = ramp(4);
        assert_eq!(sample_points(&points, 10).expect("valid"), points);
    }

    #[test]
    fn sampling_below_two_points_is_rejected() {
        let err = sample_points(&ramp(5), 1).expect_err("must reject");
        assert!(matches!(err, ProjectionError::InvalidInput { name: "maxPoints", .. }));
    }

    #[test]
    fn summary_finds_peak_and_fire_age() {
        let mut points = ramp(10);
        points[9].net_worth = 100.0;
        let summary = summarize(&points, 45.0).expect("non-empty");
        assert_eq!(summary.peak_age, 38);
        assert_eq!(summary.peak_net_worth, 8_000.0);
        assert_eq!(summary.final_net_worth, 100.0);
        assert_eq!(summary.fire_age, Some(35));
        assert!(summarize(&[], 45.0).is_none());
        assert_eq!(summarize(&points, 0.0).and_then(|s| s.fire_age), None);
    }
}
