//! IANA timezone detection and client timestamps sent with each turn

use std::fs;
use std::path::Path;

use chrono::{Local, Utc};
use chrono_tz::Tz;
use tracing::debug;

pub const FALLBACK_TIMEZONE: &str = "UTC";

pub fn is_valid_timezone(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

/// Pick the timezone to report: a valid override wins, otherwise detect
pub fn resolve_timezone(override_tz: Option<&str>) -> String {
    if let Some(tz) = override_tz.map(str::trim).filter(|tz| !tz.is_empty()) {
        if is_valid_timezone(tz) {
            return tz.to_string();
        }
        debug!(timezone = tz, "ignoring unknown timezone override");
    }
    detect_timezone()
}

/// Detect the system timezone from `TZ`, `/etc/timezone`, then `/etc/localtime`
pub fn detect_timezone() -> String {
    detect_from(
        std::env::var("TZ").ok(),
        Path::new("/etc/timezone"),
        Path::new("/etc/localtime"),
    )
}

fn detect_from(tz_env: Option<String>, etc_timezone: &Path, localtime: &Path) -> String {
    let candidates = [
        tz_env.map(|tz| tz.trim_start_matches(':').trim().to_string()),
        fs::read_to_string(etc_timezone)
            .ok()
            .map(|s| s.trim().to_string()),
        zone_from_link(localtime),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|tz| is_valid_timezone(tz))
        .unwrap_or_else(|| FALLBACK_TIMEZONE.to_string())
}

/// `/etc/localtime` is usually a symlink into `.../zoneinfo/<Area>/<City>`
fn zone_from_link(localtime: &Path) -> Option<String> {
    let target = fs::read_link(localtime).ok()?;
    let target = target.to_string_lossy();
    let (_, zone) = target.split_once("zoneinfo/")?;
    Some(zone.to_string())
}

/// Current time as RFC 3339 in the given zone, local offset if it is unknown
pub fn client_time(timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => Utc::now().with_timezone(&tz).to_rfc3339(),
        Err(_) => Local::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_valid_timezones() {
        assert!(is_valid_timezone("Asia/Kolkata"));
        assert!(is_valid_timezone("UTC"));
        assert!(!is_valid_timezone("Mars/Olympus"));
        assert!(!is_valid_timezone(""));
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(resolve_timezone(Some("Europe/Berlin")), "Europe/Berlin");
    }

    #[test]
    fn test_tz_env_with_colon_prefix() {
        let dir = TempDir::new().unwrap();
        let tz = detect_from(
            Some(":America/New_York".to_string()),
            &dir.path().join("missing"),
            &dir.path().join("missing-link"),
        );
        assert_eq!(tz, "America/New_York");
    }

    #[test]
    fn test_etc_timezone_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("timezone");
        fs::write(&file, "Asia/Kolkata\n").unwrap();

        let tz = detect_from(None, &file, &dir.path().join("missing-link"));
        assert_eq!(tz, "Asia/Kolkata");
    }

    #[test]
    fn test_invalid_env_falls_through() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("timezone");
        fs::write(&file, "Europe/Paris").unwrap();

        let tz = detect_from(Some("Not/AZone".to_string()), &file, &dir.path().join("x"));
        assert_eq!(tz, "Europe/Paris");
    }

    #[cfg(unix)]
    #[test]
    fn test_localtime_symlink() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("localtime");
        std::os::unix::fs::symlink("/usr/share/zoneinfo/Europe/Lisbon", &link).unwrap();

        let tz = detect_from(None, &dir.path().join("missing"), &link);
        assert_eq!(tz, "Europe/Lisbon");
    }

    #[test]
    fn test_fallback_is_utc() {
        let dir = TempDir::new().unwrap();
        let tz = detect_from(None, &dir.path().join("a"), &dir.path().join("b"));
        assert_eq!(tz, FALLBACK_TIMEZONE);
    }

    #[test]
    fn test_client_time_is_rfc3339() {
        let stamp = client_time("Asia/Kolkata");
        assert!(stamp.ends_with("+05:30"));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
