/// Tuning parameters for the dynamic-speed waypoint controller.
///
/// Mirrors the built-in profiles of the original circuit-racing tool:
/// a handful of archetypal vehicles rather than a full drivetrain model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleProfile {
    pub top_speed_kph: f64,
    pub accel_kph_s: f64,
    pub brake_kph_s: f64,
    pub min_corner_speed_kph: f64,
}

impl VehicleProfile {
    pub const fn new(
        top_speed_kph: f64,
        accel_kph_s: f64,
        brake_kph_s: f64,
        min_corner_speed_kph: f64,
    ) -> Self {
        Self {
            top_speed_kph,
            accel_kph_s,
            brake_kph_s,
            min_corner_speed_kph,
        }
    }

    pub const F1: VehicleProfile = VehicleProfile::new(300.0, 60.0, 80.0, 120.0);
    pub const GO_KART: VehicleProfile = VehicleProfile::new(80.0, 25.0, 35.0, 40.0);
    pub const BICYCLE: VehicleProfile = VehicleProfile::new(35.0, 6.0, 12.0, 15.0);

    /// Resolve a profile by its configured name, for front-ends that store
    /// the choice as a string (e.g. loaded from a config file).
    pub fn by_name(name: &str) -> Option<VehicleProfile> {
        match name.to_ascii_lowercase().as_str() {
            "f1" => Some(VehicleProfile::F1),
            "go-kart" | "go_kart" | "gokart" => Some(VehicleProfile::GO_KART),
            "bicycle" => Some(VehicleProfile::BICYCLE),
            _ => None,
        }
    }
}
