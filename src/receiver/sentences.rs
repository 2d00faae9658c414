//! NMEA-0183 sentence formatting: bit-exact field layout and checksums.

use super::Receiver;
use crate::constants::KPH_TO_KNOTS;
use hifitime::Epoch;

/// Uppercase two-hex XOR checksum of every byte strictly between `$` and `*`.
fn checksum(body: &str) -> String {
    let cs = body.bytes().fold(0u8, |c, b| c ^ b);
    format!("{cs:02X}")
}

/// Builds `$<talker><id>,<fields>*<CHK>` without the trailing delimiter —
/// the driver appends the configured delimiter between sentences.
fn sentence(talker: &str, id: &str, fields: &str) -> String {
    let body = format!("{talker}{id},{fields}");
    format!("${body}*{}", checksum(&body))
}

fn lat_field(lat_deg: f64) -> (String, char) {
    let hemi = if lat_deg >= 0.0 { 'N' } else { 'S' };
    let abs = lat_deg.abs();
    let degrees = abs.trunc() as u32;
    let minutes = (abs - degrees as f64) * 60.0;
    (format!("{degrees:02}{minutes:07.4}"), hemi)
}

fn lon_field(lon_deg: f64) -> (String, char) {
    let hemi = if lon_deg >= 0.0 { 'E' } else { 'W' };
    let abs = lon_deg.abs();
    let degrees = abs.trunc() as u32;
    let minutes = (abs - degrees as f64) * 60.0;
    (format!("{degrees:03}{minutes:07.4}"), hemi)
}

fn time_field(date_time: Option<Epoch>) -> String {
    match date_time {
        Some(t) => {
            let (_, _, _, h, m, s, ns) = t.to_gregorian_utc();
            let frac = ns as f64 / 1e9;
            format!("{h:02}{m:02}{:05.2}", s as f64 + frac)
        }
        None => String::new(),
    }
}

fn date_field(date_time: Option<Epoch>) -> String {
    match date_time {
        Some(t) => {
            let (y, mo, d, ..) = t.to_gregorian_utc();
            format!("{d:02}{mo:02}{:02}", y % 100)
        }
        None => String::new(),
    }
}

pub fn gga(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let time = time_field(r.date_time);
    let (lat, lat_h, lon, lon_h) = match r.position {
        Some(p) => {
            let (lat, lat_h) = lat_field(p.lat_deg);
            let (lon, lon_h) = lon_field(p.lon_deg);
            (lat, lat_h, lon, lon_h)
        }
        None => (String::new(), 'N', String::new(), 'E'),
    };
    let alt = r.position.and_then(|p| p.altitude_m).unwrap_or(0.0);
    let fields = format!(
        "{time},{lat},{lat_h},{lon},{lon_h},{},{:02},{:.1},{:.1},M,0.0,M,,",
        r.fix.gga_quality(),
        r.num_sats(),
        r.hdop,
        alt,
    );
    sentence(talker, "GGA", &fields)
}

pub fn gll(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let (lat, lat_h, lon, lon_h) = match r.position {
        Some(p) => {
            let (lat, lat_h) = lat_field(p.lat_deg);
            let (lon, lon_h) = lon_field(p.lon_deg);
            (lat, lat_h, lon, lon_h)
        }
        None => (String::new(), 'N', String::new(), 'E'),
    };
    let status = if r.fix.is_fix() { 'A' } else { 'V' };
    let time = time_field(r.date_time);
    let fields = format!("{lat},{lat_h},{lon},{lon_h},{time},{status},A");
    sentence(talker, "GLL", &fields)
}

pub fn gsa(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let mut prns: Vec<String> = r.satellites.iter().take(12).map(|s| format!("{:02}", s.prn)).collect();
    while prns.len() < 12 {
        prns.push(String::new());
    }
    let fields = format!(
        "A,{},{},{:.1},{:.1},{:.1}",
        r.fix.gsa_mode(),
        prns.join(","),
        r.pdop,
        r.hdop,
        r.vdop,
    );
    sentence(talker, "GSA", &fields)
}

/// Expands to one sentence per page of up to 4 satellites.
pub fn gsv(r: &Receiver) -> Vec<String> {
    let talker = r.talker_id.as_str();
    if r.satellites.is_empty() {
        return vec![sentence(talker, "GSV", &format!("1,1,{}", 0))];
    }
    let total_sats = r.satellites.len();
    let total_msgs = total_sats.div_ceil(4);
    let mut out = Vec::with_capacity(total_msgs);
    for (page, chunk) in r.satellites.chunks(4).enumerate() {
        let mut fields = format!("{},{},{}", total_msgs, page + 1, total_sats);
        for sat in chunk {
            fields.push_str(&format!(
                ",{:02},{:02},{:03},{:02}",
                sat.prn,
                sat.elevation_deg.round().clamp(0.0, 90.0) as i32,
                sat.azimuth_deg.rem_euclid(360.0).round() as i32,
                sat.snr_db.round().clamp(0.0, 99.0) as i32,
            ));
        }
        out.push(sentence(talker, "GSV", &fields));
    }
    out
}

pub fn rmc(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let time = time_field(r.date_time);
    let date = date_field(r.date_time);
    let status = if r.fix.is_fix() { 'A' } else { 'V' };
    let (lat, lat_h, lon, lon_h) = match r.position {
        Some(p) => {
            let (lat, lat_h) = lat_field(p.lat_deg);
            let (lon, lon_h) = lon_field(p.lon_deg);
            (lat, lat_h, lon, lon_h)
        }
        None => (String::new(), 'N', String::new(), 'E'),
    };
    let knots = r.speed_kph * KPH_TO_KNOTS;
    let course = r.heading_deg.unwrap_or(0.0);
    let fields = format!(
        "{time},{status},{lat},{lat_h},{lon},{lon_h},{knots:.1},{course:.1},{date},,,A"
    );
    sentence(talker, "RMC", &fields)
}

pub fn vtg(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let course = r.heading_deg.unwrap_or(0.0);
    let knots = r.speed_kph * KPH_TO_KNOTS;
    let fields = format!("{course:.1},T,,M,{knots:.1},N,{:.1},K,A", r.speed_kph);
    sentence(talker, "VTG", &fields)
}

pub fn zda(r: &Receiver) -> String {
    let talker = r.talker_id.as_str();
    let time = time_field(r.date_time);
    let (date_day, date_month, date_year) = match r.date_time {
        Some(t) => {
            let (y, mo, d, ..) = t.to_gregorian_utc();
            (format!("{d:02}"), format!("{mo:02}"), format!("{y:04}"))
        }
        None => (String::new(), String::new(), String::new()),
    };
    let fields = format!("{time},{date_day},{date_month},{date_year},00,00");
    sentence(talker, "ZDA", &fields)
}

/// Verifies the checksum embedded in a fully formatted sentence (no
/// trailing delimiter) against the body it was computed from.
pub fn verify_checksum(line: &str) -> bool {
    let Some(dollar) = line.find('$') else { return false };
    let Some(star) = line.rfind('*') else { return false };
    if star <= dollar {
        return false;
    }
    let body = &line[dollar + 1..star];
    let expected = &line[star + 1..];
    checksum(body).eq_ignore_ascii_case(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Position;
    use crate::receiver::{FixType, Satellite, TalkerId};
    use test_case::test_case;

    fn receiver_with_fix() -> Receiver {
        let mut r = Receiver::new(TalkerId::Gp)
            .with_fix(Position::new(51.5074, -0.1278), Epoch::from_gregorian_utc(2024, 3, 15, 12, 30, 45, 0));
        r.satellites.push(Satellite::new(1, 40.0, 45.0, 90.0));
        r.satellites.push(Satellite::new(2, 38.0, 30.0, 180.0));
        r
    }

    #[test_case("GGA"; "gga checksum")]
    #[test_case("GLL"; "gll checksum")]
    #[test_case("GSA"; "gsa checksum")]
    #[test_case("RMC"; "rmc checksum")]
    #[test_case("VTG"; "vtg checksum")]
    #[test_case("ZDA"; "zda checksum")]
    fn emitted_sentence_checksum_round_trips(id: &str) {
        let r = receiver_with_fix();
        let line = match id {
            "GGA" => gga(&r),
            "GLL" => gll(&r),
            "GSA" => gsa(&r),
            "RMC" => rmc(&r),
            "VTG" => vtg(&r),
            "ZDA" => zda(&r),
            _ => unreachable!(),
        };
        assert!(line.starts_with('$'));
        assert!(verify_checksum(&line), "bad checksum in {line}");
    }

    #[test]
    fn gsv_pages_satellites_in_groups_of_four() {
        let mut r = receiver_with_fix();
        for prn in 3..=7 {
            r.satellites.push(Satellite::new(prn, 35.0, 10.0, 10.0));
        }
        let pages = gsv(&r);
        assert_eq!(pages.len(), 2);
        assert!(verify_checksum(&pages[0]));
        assert!(verify_checksum(&pages[1]));
    }

    #[test]
    fn rmc_status_reflects_fix_state() {
        let mut r = receiver_with_fix();
        assert!(rmc(&r).contains(",A,"));
        r.fix = FixType::NoFix;
        assert!(rmc(&r).contains(",V,"));
    }

    #[test]
    fn lat_lon_fields_use_hemisphere_indicators() {
        let (lat, h) = lat_field(-33.8688);
        assert_eq!(h, 'S');
        assert!(lat.starts_with("33"));
        let (lon, h2) = lon_field(151.2093);
        assert_eq!(h2, 'E');
        assert!(lon.starts_with("151"));
    }
}
