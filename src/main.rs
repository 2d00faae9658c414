use clap::Parser;
use hifitime::Epoch;
use nmea_sim::config::DriverConfig;
use nmea_sim::driver::sink::WriteSink;
use nmea_sim::driver::Driver;
use nmea_sim::geodesy::Position;
use nmea_sim::motion::{
    CircularTargeting, RotationSense, SpeedMode, Strategy, VehicleProfile, WaypointTargeting,
};
use nmea_sim::receiver::{Receiver, TalkerId};
use std::io::stdout;
use std::sync::Arc;

/// Streams simulated NMEA-0183 sentences to stdout.
#[derive(Parser, Debug)]
#[command(name = "nmea-sim", about = "NMEA-0183 GPS/GLONASS signal simulator")]
struct Cli {
    /// Wall-clock tick period, seconds.
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Simulated time advance per tick, seconds.
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Starting latitude, decimal degrees.
    #[arg(long, default_value_t = 51.5074)]
    lat: f64,

    /// Starting longitude, decimal degrees.
    #[arg(long, default_value_t = -0.1278)]
    lon: f64,

    /// Vehicle profile for the bundled waypoint demo (f1, go-kart, bicycle).
    #[arg(long)]
    profile: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let position = Position::new(cli.lat, cli.lon);
    let start = Epoch::now().unwrap_or_else(|_| Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0));
    let receiver = Receiver::new(TalkerId::Gp).with_fix(position, start);

    let config = DriverConfig::default()
        .with_interval_seconds(cli.interval)
        .with_step_seconds(cli.step);

    let driver = Arc::new(Driver::new(vec![receiver], config));

    let strategy = cli
        .profile
        .as_deref()
        .and_then(VehicleProfile::by_name)
        .and_then(|profile| {
            let circuit = vec![
                position,
                Position::new(cli.lat + 0.01, cli.lon + 0.01),
                Position::new(cli.lat + 0.02, cli.lon - 0.01),
                Position::new(cli.lat, cli.lon - 0.02),
            ];
            WaypointTargeting::new(circuit, true, 20.0, SpeedMode::Dynamic(profile))
                .ok()
                .map(Strategy::Waypoint)
        })
        .unwrap_or_else(|| {
            Strategy::Circular(CircularTargeting::new(
                position,
                1000.0,
                10.0,
                RotationSense::Clockwise,
                0.0,
            ))
        });
    driver.set_targeting(strategy);

    log::info!(
        "serving NMEA sentences on stdout, interval={}s step={}s",
        cli.interval,
        cli.step
    );
    driver.serve(Box::new(WriteSink::new(stdout())), true);
}
