//! Built-in example problems

use milp_solver::Model;

/// Bounded LP with two rows; optimum x = (3, 34, 0, 6), z = -64
pub fn bounded_lp() -> Model {
    let inf = f64::INFINITY;
    Model::new(
        vec![vec![2.0, 1.0, 1.0, 0.0], vec![20.0, 1.0, 0.0, 1.0]],
        vec![40.0, 100.0],
        vec![-10.0, -1.0, 0.0, 0.0],
    )
    .with_bounds(vec![2.0, 0.0, 0.0, 0.0], vec![3.0, inf, inf, inf])
}

/// Set packing with three binary-like integers; optimum z = -1
pub fn set_packing() -> Model {
    Model::new(
        vec![
            vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
            vec![0.5, 0.5, 1.0, 1.0, 0.0, 1.0],
        ],
        vec![1.0, 1.0, 1.0],
        vec![-1.0, -1.0, -1.0, 0.0, 0.0, 0.0],
    )
    .with_integers(vec![true, true, true, false, false, false])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demos_are_valid() {
        assert!(bounded_lp().validate().is_ok());
        assert!(set_packing().validate().is_ok());
        assert_eq!(set_packing().num_integers(), 3);
    }
}
