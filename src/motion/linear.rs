use super::{Advance, Status, StatusValue};
use crate::geodesy::{bearing_deg, destination, distance_km, Position};

/// Straight-line targeting toward a fixed point.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTargeting {
    target: Position,
    cruise_speed_kph: f64,
    stop_at_target: bool,
    arrival_threshold_m: f64,

    initial_distance_km: Option<f64>,
    arrived: bool,
    total_distance_km: f64,
}

impl LinearTargeting {
    pub fn new(
        target: Position,
        cruise_speed_kph: f64,
        stop_at_target: bool,
        arrival_threshold_m: f64,
    ) -> Self {
        Self {
            target,
            cruise_speed_kph,
            stop_at_target,
            arrival_threshold_m,
            initial_distance_km: None,
            arrived: false,
            total_distance_km: 0.0,
        }
    }

    pub fn next(
        &mut self,
        pos: Position,
        heading_deg: f64,
        _speed_kph: f64,
        dt_seconds: f64,
    ) -> Advance {
        let d = distance_km(pos, self.target);
        if self.initial_distance_km.is_none() {
            self.initial_distance_km = Some(d);
        }

        if d * 1000.0 <= self.arrival_threshold_m {
            self.arrived = true;
            if self.stop_at_target {
                return Advance {
                    position: pos,
                    heading_deg,
                    speed_kph: 0.0,
                };
            }
        }

        let bearing = bearing_deg(pos, self.target);
        let mut step_km = self.cruise_speed_kph / 3600.0 * dt_seconds;
        if self.stop_at_target && step_km > d {
            step_km = d;
        }
        let new_pos = destination(pos, bearing, step_km);
        self.total_distance_km += step_km;

        Advance {
            position: new_pos,
            heading_deg: bearing,
            speed_kph: self.cruise_speed_kph,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.arrived && self.stop_at_target
    }

    pub fn reset(&mut self) {
        self.initial_distance_km = None;
        self.arrived = false;
        self.total_distance_km = 0.0;
    }

    /// Implementation-defined: the upstream tool recomputes remaining
    /// distance from the origin rather than the live position, which is a
    /// likely bug preserved here rather than "fixed" out from under callers.
    /// Only `is_complete`/`arrived` carry contracts; this is best-effort.
    pub fn progress(&self) -> f64 {
        match self.initial_distance_km {
            Some(initial) if initial > 0.0 => {
                let remaining = distance_km(Position::new(0.0, 0.0), self.target);
                (1.0 - remaining / initial).clamp(0.0, 1.0)
            }
            Some(_) => 1.0,
            None => -1.0,
        }
    }

    pub fn status(&self) -> Status {
        let mut status = Status::new();
        status.insert(
            "target_lat",
            StatusValue::Number(self.target.lat_deg),
        );
        status.insert(
            "target_lon",
            StatusValue::Number(self.target.lon_deg),
        );
        status.insert("arrived", StatusValue::Bool(self.arrived));
        status.insert(
            "stop_at_target",
            StatusValue::Bool(self.stop_at_target),
        );
        status
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn completes_immediately_when_already_at_target() {
        let start = Position::new(51.5074, -0.1278);
        let mut s = LinearTargeting::new(start, 900.0, true, 10.0);
        let adv = s.next(start, 0.0, 0.0, 1.0);
        assert!(s.is_complete());
        assert_eq!(adv.speed_kph, 0.0);
    }

    #[test]
    fn reaches_paris_within_one_tick_at_cruise_altitude_speed() {
        let start = Position::new(51.5074, -0.1278);
        let paris = Position::new(48.8566, 2.3522);
        let mut s = LinearTargeting::new(paris, 900.0, true, 10.0);
        let adv = s.next(start, 0.0, 0.0, 3600.0);
        assert!(s.is_complete());
        assert_abs_diff_eq!(distance_km(adv.position, paris), 0.0, epsilon = 0.01);
    }

    #[test]
    fn keeps_moving_without_stop_at_target() {
        let start = Position::new(0.0, 0.0);
        let target = Position::new(0.0, 1.0);
        let mut s = LinearTargeting::new(target, 100.0, false, 10.0);
        let adv = s.next(start, 0.0, 0.0, 36.0);
        assert!(!s.is_complete());
        assert_eq!(adv.speed_kph, 100.0);
    }
}
