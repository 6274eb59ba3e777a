//! Small formatting helpers.

use std::time::Duration;

/// Format an elapsed duration for humans.
///
/// Sub-minute durations keep two decimals since most runs finish in seconds.
pub fn humanize_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_duration() {
        assert_eq!(humanize_duration(Duration::from_millis(1234)), "1.23s");
        assert_eq!(humanize_duration(Duration::from_secs(0)), "0.00s");
        assert_eq!(humanize_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(humanize_duration(Duration::from_secs(3725)), "1h 2m");
    }
}
