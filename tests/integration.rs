use hifitime::Epoch;
use nmea_sim::config::DriverConfig;
use nmea_sim::driver::sink::WriteSink;
use nmea_sim::driver::Driver;
use nmea_sim::geodesy::{distance_km, Position};
use nmea_sim::motion::{
    CircularTargeting, LinearTargeting, RotationSense, SpeedAction, SpeedMode, Strategy,
    VehicleProfile, WaypointTargeting,
};
use nmea_sim::receiver::{Receiver, TalkerId};
use std::sync::Arc;

fn epoch() -> Epoch {
    Epoch::from_gregorian_utc(2024, 3, 15, 12, 0, 0, 0)
}

fn fixed_receiver(position: Position) -> Receiver {
    Receiver::new(TalkerId::Gp).with_fix(position, epoch())
}

fn checksum_of(body: &str) -> String {
    format!("{:02X}", body.bytes().fold(0u8, |c, b| c ^ b))
}

fn assert_checksums_valid(lines: &str) {
    for line in lines.split("\r\n").filter(|l| !l.is_empty()) {
        let dollar = line.find('$').expect("sentence must start with $");
        let star = line.rfind('*').expect("sentence must carry a checksum");
        let body = &line[dollar + 1..star];
        let expected = &line[star + 1..];
        assert_eq!(
            checksum_of(body),
            expected.to_ascii_uppercase(),
            "bad checksum in {line}"
        );
    }
}

#[test]
fn scenario_static_at_london() {
    let london = Position::new(51.5074, -0.1278);
    let mut receiver = fixed_receiver(london);
    receiver.enabled_sentences = ["GGA", "RMC"].into_iter().collect();
    let driver = Driver::new(vec![receiver], DriverConfig::default());

    let mut buf = Vec::new();
    {
        let mut sink = WriteSink::new(&mut buf);
        driver.generate(3.0, &mut sink).unwrap();
    }
    let output = String::from_utf8(buf).unwrap();
    assert_checksums_valid(&output);

    for line in output.split("\r\n").filter(|l| l.starts_with("$GPGGA")) {
        let fields: Vec<&str> = line.split(',').collect();
        let lat = fields[2].parse::<f64>().unwrap() / 100.0;
        let lat_deg = lat.trunc() + (lat.fract() * 100.0) / 60.0;
        assert!((lat_deg - 51.5074).abs() < 1e-3);
    }
    for line in output.split("\r\n").filter(|l| l.starts_with("$GPRMC")) {
        assert!(line.contains(",A,"));
    }
}

#[test]
fn scenario_linear_to_paris() {
    let london = Position::new(51.5074, -0.1278);
    let paris = Position::new(48.8566, 2.3522);
    let receiver = fixed_receiver(london);
    let driver = Driver::new(
        vec![receiver],
        DriverConfig::default().with_step_seconds(3600.0),
    );
    driver.set_targeting(Strategy::Linear(LinearTargeting::new(
        paris, 900.0, true, 10.0,
    )));

    let mut buf = Vec::new();
    {
        let mut sink = WriteSink::new(&mut buf);
        driver.generate(3600.0, &mut sink).unwrap();
    }
    assert!(driver.get_targeting_status()["type"] == nmea_sim::motion::StatusValue::Text("linear".to_string()));
}

#[test]
fn scenario_circular_one_km_at_london() {
    let london = Position::new(51.5074, -0.1278);
    let mut strategy = CircularTargeting::new(london, 1000.0, 36.0, RotationSense::Clockwise, 0.0);
    let mut last_speed = 0.0;
    for _ in 0..10 {
        let adv = strategy.next(london, 0.0, 0.0, 1.0);
        assert!((distance_km(london, adv.position) - 1.0).abs() < 1e-3);
        last_speed = adv.speed_kph;
    }
    assert!((last_speed - 226.194671).abs() < 1e-2);
    assert_eq!(strategy.laps(), 1);
}

#[test]
fn scenario_waypoint_square_manual_loop() {
    let waypoints = vec![
        Position::new(0.0, 0.0),
        Position::new(0.0, 0.001),
        Position::new(0.001, 0.001),
        Position::new(0.001, 0.0),
    ];
    let mut strategy =
        WaypointTargeting::new(waypoints, true, 20.0, SpeedMode::Manual(50.0)).unwrap();
    let mut pos = Position::new(0.0, 0.0);
    let mut seen_indices = std::collections::BTreeSet::new();
    for _ in 0..500 {
        seen_indices.insert(strategy.current_index());
        let adv = strategy.next(pos, 0.0, 0.0, 1.0);
        pos = adv.position;
        if strategy.laps_completed() >= 1 {
            break;
        }
    }
    assert!(strategy.laps_completed() >= 1);
    assert!(seen_indices.is_subset(&[0, 1, 2, 3].into_iter().collect()));
}

#[test]
fn scenario_waypoint_f1_dynamic_brakes_for_sharp_corner() {
    // A route with a sharp (near-180 degree) corner at index 2.
    let waypoints = vec![
        Position::new(0.0, 0.0),
        Position::new(0.0, 0.05),
        Position::new(0.0, 0.10),
        Position::new(0.0, 0.05 + 1e-6),
        Position::new(0.0, 0.0 + 2e-6),
    ];
    let profile = VehicleProfile::F1;
    let mut strategy =
        WaypointTargeting::new(waypoints, false, 10.0, SpeedMode::Dynamic(profile)).unwrap();
    let mut pos = Position::new(0.0, 0.0);

    let mut saw_brake = false;
    for _ in 0..300 {
        let adv = strategy.next(pos, 0.0, 0.0, 0.5);
        pos = adv.position;
        if let Some(SpeedAction::Brake { .. }) = strategy.last_action() {
            saw_brake = true;
        }
        if strategy.current_speed_kph() <= profile.min_corner_speed_kph + 5.0 {
            break;
        }
    }
    assert!(saw_brake, "expected a braking action approaching the sharp corner");
    assert!(strategy.current_speed_kph() >= profile.min_corner_speed_kph - 1e-9);
}

#[test]
fn scenario_checksum_round_trip_across_all_sentence_types() {
    let london = Position::new(51.5074, -0.1278);
    let receiver = fixed_receiver(london);
    let driver = Driver::new(vec![receiver], DriverConfig::default());
    let mut buf = Vec::new();
    {
        let mut sink = WriteSink::new(&mut buf);
        driver.generate(5.0, &mut sink).unwrap();
    }
    let output = String::from_utf8(buf).unwrap();
    assert!(!output.is_empty());
    assert_checksums_valid(&output);
}

#[test]
fn kill_during_blocking_serve_returns_quickly() {
    let receiver = fixed_receiver(Position::new(51.5074, -0.1278));
    let driver = Arc::new(Driver::new(
        vec![receiver],
        DriverConfig::default()
            .with_interval_seconds(0.1)
            .with_step_seconds(0.1),
    ));
    let killer = Arc::clone(&driver);
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        killer.kill();
    });
    let started = std::time::Instant::now();
    driver.serve(Box::new(WriteSink::new(std::io::sink())), true);
    assert!(started.elapsed() < std::time::Duration::from_millis(500));
}
