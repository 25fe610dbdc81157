use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use tracing::warn;

/// `2014-12-09 09:14 AM`. chrono only knows English meridiem names, which
/// is what `lscm` prints regardless of the host locale.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M %p";

#[derive(Debug, Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// Turns annotate timestamps into absolute times.
///
/// `lscm` prints wall-clock time without a zone, so the parser needs to be
/// told which zone that wall clock belongs to. The default is the host's.
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    zone: Zone,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::local()
    }
}

impl TimestampParser {
    pub fn local() -> Self {
        Self { zone: Zone::Local }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            zone: Zone::Fixed(offset),
        }
    }

    /// Returns `None` (and logs) when `text` can't be read. A bad date never
    /// fails the blame.
    pub fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let naive = match NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
            Ok(naive) => naive,
            Err(e) => {
                warn!(
                    date = text,
                    pattern = TIMESTAMP_FORMAT,
                    error = %e,
                    "Skipping unparseable annotate date"
                );
                return None;
            }
        };

        let resolved = match self.zone {
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.fixed_offset()),
        };

        if resolved.is_none() {
            warn!(date = text, "Annotate date does not exist in the local time zone");
        }
        resolved
    }
}
