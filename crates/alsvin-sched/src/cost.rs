//! Monetary cost estimation.

use alsvin_hal::CostModel;

/// Estimate the cost of running `shots` shots for `execution_seconds` on a
/// device: per-shot and per-second charges, floored at the minimum charge.
pub fn estimate_cost(shots: u32, execution_seconds: f64, model: &CostModel) -> f64 {
    let variable =
        f64::from(shots) * model.cost_per_shot + execution_seconds * model.cost_per_second;
    variable.max(model.minimum_cost)
}

/// Normalized cost score in `[0, 1]`: free jobs score 1, jobs at or beyond
/// the user's budget score 0.
pub fn cost_score(total_cost: f64, max_cost_per_job: f64) -> f64 {
    if max_cost_per_job <= 0.0 {
        return 0.0;
    }
    (1.0 - total_cost / max_cost_per_job).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CostModel {
        CostModel {
            cost_per_shot: 0.001,
            cost_per_second: 0.05,
            minimum_cost: 0.5,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_variable_cost_dominates() {
        let cost = estimate_cost(10_000, 20.0, &model());
        assert!((cost - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_minimum_cost_floor() {
        let cost = estimate_cost(10, 0.1, &model());
        assert!((cost - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cost_score_bounds() {
        assert!((cost_score(0.0, 10.0) - 1.0).abs() < 1e-12);
        assert!((cost_score(5.0, 10.0) - 0.5).abs() < 1e-12);
        assert_eq!(cost_score(25.0, 10.0), 0.0);
        assert_eq!(cost_score(1.0, 0.0), 0.0);
    }
}
