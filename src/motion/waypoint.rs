use super::vehicle_profile::VehicleProfile;
use super::{Advance, Status, StatusValue};
use crate::errors::SimError;
use crate::geodesy::{bearing_deg, bearing_delta_deg, destination, distance_km, Position};

const MAX_LOOKAHEAD_CORNERS: usize = 20;
/// Turn angles at or below this are treated as flat-out.
const SHALLOW_TURN_DEG: f64 = 15.0;
/// Turn angles at or above this get the profile's minimum corner speed.
const SHARP_TURN_DEG: f64 = 45.0;
/// Acceleration/braking fraction above which a `SpeedAction` is recorded.
const ACTION_REPORT_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedMode {
    Manual(f64),
    Dynamic(VehicleProfile),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeedAction {
    Accel { pct: f64, reason: String },
    Brake { pct: f64, reason: String },
}

/// Waypoint-following targeting, with an optional look-ahead dynamic speed
/// controller (`SpeedMode::Dynamic`) modeled on a simple vehicle profile.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointTargeting {
    waypoints: Vec<Position>,
    loop_route: bool,
    arrival_threshold_m: f64,
    mode: SpeedMode,

    current_index: usize,
    current_speed_kph: f64,
    laps: u64,
    last_action: Option<SpeedAction>,
    route_distance_km: Option<f64>,
    total_distance_km: f64,
    completed: bool,
    elapsed_since_lap_start_s: f64,
    last_lap_seconds: Option<f64>,
}

impl WaypointTargeting {
    pub fn new(
        waypoints: Vec<Position>,
        loop_route: bool,
        arrival_threshold_m: f64,
        mode: SpeedMode,
    ) -> Result<Self, SimError> {
        if waypoints.len() < 2 {
            return Err(SimError::InvalidConfiguration(
                "waypoint route needs at least 2 points".into(),
            ));
        }
        let current_speed_kph = match mode {
            SpeedMode::Manual(v) => v,
            SpeedMode::Dynamic(_) => 0.0,
        };
        Ok(Self {
            waypoints,
            loop_route,
            arrival_threshold_m,
            mode,
            current_index: 0,
            current_speed_kph,
            laps: 0,
            last_action: None,
            route_distance_km: None,
            total_distance_km: 0.0,
            completed: false,
            elapsed_since_lap_start_s: 0.0,
            last_lap_seconds: None,
        })
    }

    pub fn add_waypoint(&mut self, pos: Position, index: Option<usize>) {
        match index {
            Some(i) => self.waypoints.insert(i.min(self.waypoints.len()), pos),
            None => self.waypoints.push(pos),
        }
        self.route_distance_km = None;
    }

    pub fn remove_waypoint(&mut self, index: usize) -> Result<(), SimError> {
        if self.waypoints.len() <= 2 {
            return Err(SimError::InvalidConfiguration(
                "cannot shrink a waypoint route below 2 points".into(),
            ));
        }
        if index >= self.waypoints.len() {
            return Err(SimError::InvalidConfiguration(format!(
                "waypoint index {index} out of range"
            )));
        }
        self.waypoints.remove(index);
        if self.current_index >= index && self.current_index > 0 {
            self.current_index -= 1;
        }
        self.route_distance_km = None;
        Ok(())
    }

    /// Returns `true` when the route just completed (non-looping overflow).
    fn normalize_index(&mut self) -> bool {
        let n = self.waypoints.len();
        if self.current_index >= n {
            if self.loop_route {
                self.current_index = 0;
                self.laps += 1;
                self.last_lap_seconds = Some(self.elapsed_since_lap_start_s);
                self.elapsed_since_lap_start_s = 0.0;
                false
            } else {
                self.completed = true;
                true
            }
        } else {
            false
        }
    }

    pub fn next(
        &mut self,
        pos: Position,
        heading_deg: f64,
        _speed_kph: f64,
        dt_seconds: f64,
    ) -> Advance {
        if self.completed {
            return Advance {
                position: pos,
                heading_deg,
                speed_kph: 0.0,
            };
        }
        self.elapsed_since_lap_start_s += dt_seconds;

        if self.normalize_index() {
            return Advance {
                position: pos,
                heading_deg,
                speed_kph: 0.0,
            };
        }

        let mut target = self.waypoints[self.current_index];
        let mut d_km = distance_km(pos, target);
        if d_km * 1000.0 <= self.arrival_threshold_m {
            self.current_index += 1;
            if self.normalize_index() {
                return Advance {
                    position: pos,
                    heading_deg,
                    speed_kph: 0.0,
                };
            }
            target = self.waypoints[self.current_index];
            d_km = distance_km(pos, target);
        }

        let bearing = bearing_deg(pos, target);
        let v_eff = match self.mode {
            SpeedMode::Manual(v) => v,
            SpeedMode::Dynamic(profile) => self.apply_dynamic_speed(pos, profile, dt_seconds),
        };

        let mut step_km = v_eff / 3600.0 * dt_seconds;
        if step_km > d_km {
            step_km = d_km;
        }
        let new_pos = destination(pos, bearing, step_km);
        self.total_distance_km += step_km;

        Advance {
            position: new_pos,
            heading_deg: bearing,
            speed_kph: v_eff,
        }
    }

    /// Waypoint index at logical offset `offset` from `current_index`,
    /// wrapping if the route loops; `None` past either end otherwise.
    fn waypoint_index_at(&self, offset: isize) -> Option<usize> {
        let n = self.waypoints.len() as isize;
        let raw = self.current_index as isize + offset;
        if self.loop_route {
            Some(raw.rem_euclid(n) as usize)
        } else if raw >= 0 && raw < n {
            Some(raw as usize)
        } else {
            None
        }
    }

    fn apply_dynamic_speed(&mut self, _pos: Position, profile: VehicleProfile, dt: f64) -> f64 {
        // Phase 1: look-ahead corners and their apex speeds. Corners are
        // analysed leg-by-leg starting at the current target waypoint, not
        // from the live position — the partial distance already covered on
        // the active leg isn't folded in.
        let mut corners: Vec<(usize, f64, f64)> = Vec::new(); // (waypoint idx, apex kph, distance_to_corner_m)
        let mut cumulative_m = 0.0_f64;

        for offset in 0..MAX_LOOKAHEAD_CORNERS as isize {
            let idx1 = self.waypoint_index_at(offset);
            let idx2 = self.waypoint_index_at(offset + 1);
            let idx3 = self.waypoint_index_at(offset + 2);
            let (idx1, idx2, idx3) = match (idx1, idx2, idx3) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => break,
            };
            let p1 = self.waypoints[idx1];
            let p2 = self.waypoints[idx2];
            let p3 = self.waypoints[idx3];

            cumulative_m += distance_km(p1, p2) * 1000.0;

            let turn_angle = bearing_delta_deg(bearing_deg(p1, p2), bearing_deg(p2, p3));
            let apex_kph = apex_speed_kph(turn_angle, profile);

            corners.push((idx2, apex_kph, cumulative_m));
        }

        // Phase 2: critical braking point.
        let v_i_mps = self.current_speed_kph * crate::constants::KPH_TO_MPS;
        let mut critical: Option<(usize, f64)> = None; // (waypoint idx, apex kph)
        for &(idx, apex_kph, dist_to_corner_m) in &corners {
            let v_f_mps = apex_kph * crate::constants::KPH_TO_MPS;
            let d_req_m = if v_f_mps >= v_i_mps {
                0.0
            } else {
                let a = profile.brake_kph_s * crate::constants::KPH_TO_MPS;
                (v_f_mps.powi(2) - v_i_mps.powi(2)) / (-2.0 * a)
            };
            if d_req_m >= dist_to_corner_m {
                critical = Some((idx, apex_kph));
                break;
            }
        }

        let (target_kph, reason) = match critical {
            Some((idx, apex_kph)) => (apex_kph, idx.to_string()),
            None => (profile.top_speed_kph, "no corner detected".to_string()),
        };

        // Phase 3: apply acceleration/braking.
        let delta = target_kph - self.current_speed_kph;
        if delta > 0.0 {
            let max_step = profile.accel_kph_s * dt;
            let applied = max_step.min(delta);
            self.current_speed_kph += applied;
            let pct = if max_step > 0.0 { applied / max_step } else { 0.0 };
            self.last_action = if pct > ACTION_REPORT_THRESHOLD {
                Some(SpeedAction::Accel { pct, reason })
            } else {
                None
            };
        } else if delta < 0.0 {
            let max_step = profile.brake_kph_s * dt;
            let applied = max_step.min(-delta);
            self.current_speed_kph -= applied;
            let pct = if max_step > 0.0 { applied / max_step } else { 0.0 };
            self.last_action = if pct > ACTION_REPORT_THRESHOLD {
                Some(SpeedAction::Brake { pct, reason })
            } else {
                None
            };
        } else {
            self.last_action = None;
        }

        self.current_speed_kph = self
            .current_speed_kph
            .clamp(profile.min_corner_speed_kph, profile.top_speed_kph);
        self.current_speed_kph
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.current_speed_kph = match self.mode {
            SpeedMode::Manual(v) => v,
            SpeedMode::Dynamic(_) => 0.0,
        };
        self.laps = 0;
        self.last_action = None;
        self.total_distance_km = 0.0;
        self.completed = false;
        self.elapsed_since_lap_start_s = 0.0;
        self.last_lap_seconds = None;
    }

    /// Progress through the current lap: current waypoint index over the
    /// total waypoint count. Resets to 0 each time the route loops.
    pub fn progress(&self) -> f64 {
        self.current_index as f64 / self.waypoints.len() as f64
    }

    pub fn status(&self) -> Status {
        let mut status = Status::new();
        status.insert("laps_completed", StatusValue::Integer(self.laps as i64));
        status.insert(
            "current_index",
            StatusValue::Integer(self.current_index as i64),
        );
        status.insert(
            "current_speed_kph",
            StatusValue::Number(self.current_speed_kph),
        );
        status.insert(
            "route_total_km",
            StatusValue::Number(self.route_total_km()),
        );
        if let Some(seconds) = self.last_lap_seconds {
            status.insert("last_lap_seconds", StatusValue::Number(seconds));
        }
        status.insert(
            "action",
            match &self.last_action {
                Some(SpeedAction::Accel { pct, reason }) => {
                    StatusValue::Text(format!("ACCEL {:.0}% ({reason})", pct * 100.0))
                }
                Some(SpeedAction::Brake { pct, reason }) => {
                    StatusValue::Text(format!("BRAKE {:.0}% ({reason})", pct * 100.0))
                }
                None => StatusValue::Text("none".to_string()),
            },
        );
        status
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn laps_completed(&self) -> u64 {
        self.laps
    }

    pub fn current_target(&self) -> Position {
        self.waypoints[self.current_index.min(self.waypoints.len() - 1)]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn last_action(&self) -> Option<&SpeedAction> {
        self.last_action.as_ref()
    }

    pub fn current_speed_kph(&self) -> f64 {
        self.current_speed_kph
    }

    /// Memoised sum of successive leg distances, plus the closing leg when
    /// the route loops. Invalidated by `add_waypoint`/`remove_waypoint`.
    pub fn route_total_km(&self) -> f64 {
        if let Some(cached) = self.route_distance_km {
            return cached;
        }
        let mut total = 0.0;
        for w in self.waypoints.windows(2) {
            total += distance_km(w[0], w[1]);
        }
        if self.loop_route {
            total += distance_km(*self.waypoints.last().unwrap(), self.waypoints[0]);
        }
        total
    }
}

fn apex_speed_kph(turn_angle_deg: f64, profile: VehicleProfile) -> f64 {
    if turn_angle_deg <= SHALLOW_TURN_DEG {
        profile.top_speed_kph
    } else if turn_angle_deg >= SHARP_TURN_DEG {
        profile.min_corner_speed_kph
    } else {
        let fraction = (turn_angle_deg - SHALLOW_TURN_DEG) / (SHARP_TURN_DEG - SHALLOW_TURN_DEG);
        profile.top_speed_kph - fraction * (profile.top_speed_kph - profile.min_corner_speed_kph)
    }
}
