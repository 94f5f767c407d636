use std::f64::consts::{FRAC_PI_8, PI};

/// Frontal reference area of a body of the given caliber, m^2.
pub fn reference_area(caliber: f64) -> f64 {
    PI * (caliber / 2.0).powi(2)
}

/// Drag force magnitude from the drag equation, N.
pub fn drag_force(density: f64, speed: f64, cd: f64, area: f64) -> f64 {
    0.5 * density * speed * speed * cd * area
}

/// Lift coefficient of the fins at a given angle of attack (rad).
///
/// Steep `sin(6a)` slope near zero and near pi, `sin(2a)` in between,
/// zero for non-positive or out-of-range angles.
pub fn lift_coefficient(aoa: f64) -> f64 {
    let upper = 7.0 * FRAC_PI_8;
    if (aoa > 0.0 && aoa < FRAC_PI_8) || (aoa > upper && aoa < PI) {
        (6.0 * aoa).sin()
    } else if (FRAC_PI_8..=upper).contains(&aoa) {
        (2.0 * aoa).sin()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_area_of_200mm_body() {
        assert_relative_eq!(reference_area(0.2), 0.031_415_926_535, epsilon = 1e-9);
    }

    #[test]
    fn drag_grows_with_square_of_speed() {
        let d1 = drag_force(0.5, 100.0, 0.4, 0.01);
        let d2 = drag_force(0.5, 200.0, 0.4, 0.01);
        assert_relative_eq!(d2 / d1, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn no_drag_at_rest() {
        assert_eq!(drag_force(0.56, 0.0, 0.5, 0.03), 0.0);
    }

    #[test]
    fn lift_zero_outside_envelope() {
        assert_eq!(lift_coefficient(0.0), 0.0);
        assert_eq!(lift_coefficient(-0.1), 0.0);
        assert_eq!(lift_coefficient(PI), 0.0);
        assert_eq!(lift_coefficient(4.0), 0.0);
    }

    #[test]
    fn lift_uses_steep_branch_at_small_aoa() {
        let aoa = 10.0_f64.to_radians();
        assert_relative_eq!(lift_coefficient(aoa), (6.0 * aoa).sin());
    }

    #[test]
    fn lift_uses_wide_branch_at_mid_aoa() {
        assert_relative_eq!(lift_coefficient(FRAC_PI_8), (2.0 * FRAC_PI_8).sin());
        let aoa = 45.0_f64.to_radians();
        assert_relative_eq!(lift_coefficient(aoa), 1.0, epsilon = 1e-12);
    }
}
