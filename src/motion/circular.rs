use super::{Advance, Status, StatusValue};
use crate::geodesy::{destination, normalize_deg, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSense {
    Clockwise,
    CounterClockwise,
}

/// Orbits a fixed centre at constant angular velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularTargeting {
    centre: Position,
    radius_m: f64,
    angular_velocity_deg_s: f64,
    sense: RotationSense,
    start_angle_deg: f64,

    current_angle_deg: f64,
    total_angle_traversed_deg: f64,
    laps: u64,
    total_distance_km: f64,
}

impl CircularTargeting {
    pub fn new(
        centre: Position,
        radius_m: f64,
        angular_velocity_deg_s: f64,
        sense: RotationSense,
        start_angle_deg: f64,
    ) -> Self {
        Self {
            centre,
            radius_m,
            angular_velocity_deg_s,
            sense,
            start_angle_deg,
            current_angle_deg: start_angle_deg,
            total_angle_traversed_deg: 0.0,
            laps: 0,
            total_distance_km: 0.0,
        }
    }

    pub fn next(
        &mut self,
        _pos: Position,
        _heading_deg: f64,
        _speed_kph: f64,
        dt_seconds: f64,
    ) -> Advance {
        let mut delta = self.angular_velocity_deg_s * dt_seconds;
        if self.sense == RotationSense::CounterClockwise {
            delta = -delta;
        }

        self.current_angle_deg = normalize_deg(self.current_angle_deg + delta);
        self.total_angle_traversed_deg += delta.abs();
        self.laps = (self.total_angle_traversed_deg / 360.0) as u64;

        let radius_km = self.radius_m / 1000.0;
        let position = destination(self.centre, self.current_angle_deg, radius_km);

        let heading_deg = match self.sense {
            RotationSense::Clockwise => normalize_deg(self.current_angle_deg + 90.0),
            RotationSense::CounterClockwise => normalize_deg(self.current_angle_deg - 90.0),
        };

        let angular_velocity_rad_s = self.angular_velocity_deg_s.to_radians();
        let speed_kph = angular_velocity_rad_s * self.radius_m * 3.6;

        self.total_distance_km += speed_kph / 3600.0 * dt_seconds;

        Advance {
            position,
            heading_deg,
            speed_kph,
        }
    }

    pub fn is_complete(&self) -> bool {
        false
    }

    pub fn reset(&mut self) {
        self.current_angle_deg = self.start_angle_deg;
        self.total_angle_traversed_deg = 0.0;
        self.laps = 0;
        self.total_distance_km = 0.0;
    }

    pub fn progress(&self) -> f64 {
        -1.0
    }

    pub fn status(&self) -> Status {
        let mut status = Status::new();
        status.insert(
            "current_angle_deg",
            StatusValue::Number(self.current_angle_deg),
        );
        status.insert("laps", StatusValue::Integer(self.laps as i64));
        status
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn current_angle_deg(&self) -> f64 {
        self.current_angle_deg
    }

    pub fn laps(&self) -> u64 {
        self.laps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::distance_km;
    use approx::assert_abs_diff_eq;

    #[test]
    fn completes_a_full_lap_after_ten_seconds_at_36_deg_per_s() {
        let centre = Position::new(51.5074, -0.1278);
        let mut s = CircularTargeting::new(centre, 1000.0, 36.0, RotationSense::Clockwise, 0.0);

        let mut last = Advance {
            position: centre,
            heading_deg: 0.0,
            speed_kph: 0.0,
        };
        for _ in 0..10 {
            last = s.next(centre, 0.0, 0.0, 1.0);
            assert_abs_diff_eq!(
                distance_km(centre, last.position),
                1.0,
                epsilon = 1e-3
            );
        }

        assert_abs_diff_eq!(s.current_angle_deg(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(last.speed_kph, 226.194671, epsilon = 1e-2);
    }

    #[test]
    fn heading_is_tangent_to_the_circle() {
        let centre = Position::new(0.0, 0.0);
        let mut s = CircularTargeting::new(centre, 500.0, 10.0, RotationSense::Clockwise, 0.0);
        let adv = s.next(centre, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(adv.heading_deg, s.current_angle_deg() + 90.0, epsilon = 1e-9);
    }

    #[test]
    fn counter_clockwise_decreases_angle() {
        let centre = Position::new(0.0, 0.0);
        let mut s =
            CircularTargeting::new(centre, 500.0, 10.0, RotationSense::CounterClockwise, 0.0);
        s.next(centre, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(s.current_angle_deg(), 350.0, epsilon = 1e-9);
    }
}
