use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

const JSON_SUFFIX: &str = ".json";

/// Naive formats tried after RFC 3339; both are read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobNameError {
    #[error("blob name {0:?} does not end with .json")]
    MissingJsonSuffix(String),

    #[error("blob name {0:?} has no '-' before the timestamp")]
    MissingSeparator(String),

    #[error("blob name {0:?} has an empty timestamp segment")]
    EmptyTimestamp(String),

    #[error("blob name {name:?}: cannot parse {restored:?} as a date-time")]
    InvalidTimestamp { name: String, restored: String },
}

/// The publish time encoded in a blob name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStamp {
    /// A full date-time.
    At(DateTime<Utc>),
    /// A bare `HH.MM.SS` stamp; the date comes from the run that reads it.
    TimeOfDay(NaiveTime),
}

impl BlobStamp {
    /// The instant this stamp denotes as seen from a run at `now`.
    ///
    /// A bare time of day is the latest occurrence at or before `now`: a blob
    /// stamped later in the day than the run was published the day before.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            BlobStamp::At(at) => at,
            BlobStamp::TimeOfDay(time) => {
                let today = now.date_naive().and_time(time).and_utc();
                if today <= now {
                    today
                } else {
                    today
                        .checked_sub_days(Days::new(1))
                        .unwrap_or(DateTime::<Utc>::MIN_UTC)
                }
            }
        }
    }
}

/// A blob file name of the form `<prefix>-<timestamp with '.' for ':'>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobName {
    pub file_name: String,
    pub prefix: String,
    pub stamp: BlobStamp,
}

impl BlobName {
    /// Split on the first `-` and the `.json` suffix, restore `:` inside the
    /// timestamp segment only, and parse what remains.
    pub fn parse(file_name: &str) -> Result<Self, BlobNameError> {
        let stem = file_name
            .strip_suffix(JSON_SUFFIX)
            .ok_or_else(|| BlobNameError::MissingJsonSuffix(file_name.to_string()))?;

        let (prefix, segment) = stem
            .split_once('-')
            .ok_or_else(|| BlobNameError::MissingSeparator(file_name.to_string()))?;

        if segment.is_empty() {
            return Err(BlobNameError::EmptyTimestamp(file_name.to_string()));
        }

        let restored = segment.replace('.', ":");
        let stamp = parse_restored(&restored).ok_or_else(|| BlobNameError::InvalidTimestamp {
            name: file_name.to_string(),
            restored: restored.clone(),
        })?;

        Ok(Self {
            file_name: file_name.to_string(),
            prefix: prefix.to_string(),
            stamp,
        })
    }
}

fn parse_restored(restored: &str) -> Option<BlobStamp> {
    if let Ok(at) = DateTime::parse_from_rfc3339(restored) {
        return Some(BlobStamp::At(at.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(restored, format) {
            return Some(BlobStamp::At(naive.and_utc()));
        }
    }

    NaiveTime::parse_from_str(restored, TIME_OF_DAY_FORMAT)
        .ok()
        .map(BlobStamp::TimeOfDay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn time_of_day_restores_colons() {
        let name = BlobName::parse("news-14.05.30.json").expect("should parse");
        assert_eq!(name.prefix, "news");
        match name.stamp {
            BlobStamp::TimeOfDay(t) => {
                assert_eq!((t.hour(), t.minute(), t.second()), (14, 5, 30));
            }
            other => panic!("expected time of day, got {other:?}"),
        }
    }

    #[test]
    fn dots_in_prefix_are_left_alone() {
        let name = BlobName::parse("athena.news-14.05.30.json").expect("should parse");
        assert_eq!(name.prefix, "athena.news");
        assert_eq!(
            name.stamp,
            BlobStamp::TimeOfDay(NaiveTime::from_hms_opt(14, 5, 30).unwrap())
        );
    }

    #[test]
    fn full_rfc3339_stamp_parses() {
        let name = BlobName::parse("news-2024-03-01T14.05.30Z.json").expect("should parse");
        assert_eq!(
            name.stamp,
            BlobStamp::At(Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 30).unwrap())
        );
    }

    #[test]
    fn offset_is_normalized_to_utc() {
        let name = BlobName::parse("news-2024-03-01T14.05.30+02.00.json").expect("should parse");
        assert_eq!(
            name.stamp.resolve(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 30).unwrap()
        );
    }

    #[test]
    fn naive_space_separated_stamp_is_utc() {
        let name = BlobName::parse("events-2024-03-01 09.00.00.json").expect("should parse");
        assert_eq!(
            name.stamp,
            BlobStamp::At(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn time_of_day_earlier_than_run_is_same_day() {
        let stamp = BlobStamp::TimeOfDay(NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        assert_eq!(
            stamp.resolve(now),
            Utc.with_ymd_and_hms(2024, 6, 2, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn time_of_day_equal_to_run_is_same_day() {
        let stamp = BlobStamp::TimeOfDay(NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 8, 30, 0).unwrap();
        assert_eq!(stamp.resolve(now), now);
    }

    #[test]
    fn time_of_day_later_than_run_is_previous_day() {
        let stamp = BlobStamp::TimeOfDay(NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0).unwrap();
        assert_eq!(
            stamp.resolve(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap()
        );
        assert!(stamp.resolve(now) <= now);
    }

    #[test]
    fn missing_suffix_is_rejected() {
        assert!(matches!(
            BlobName::parse("news-14.05.30.txt"),
            Err(BlobNameError::MissingJsonSuffix(_))
        ));
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            BlobName::parse("news14.05.30.json"),
            Err(BlobNameError::MissingSeparator(_))
        ));
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(matches!(
            BlobName::parse("news-.json"),
            Err(BlobNameError::EmptyTimestamp(_))
        ));
    }

    #[test]
    fn garbage_segment_reports_restored_text() {
        let err = BlobName::parse("news-latest.json").unwrap_err();
        assert_eq!(
            err,
            BlobNameError::InvalidTimestamp {
                name: "news-latest.json".to_string(),
                restored: "latest".to_string(),
            }
        );
    }
}
