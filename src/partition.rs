use chrono::{DateTime, Datelike, Utc};
use std::fmt;

/// Day-scoped report partition. Always derived in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<DateTime<Utc>> for PartitionKey {
    fn from(date_time: DateTime<Utc>) -> Self {
        PartitionKey {
            year: date_time.year(),
            month: date_time.month(),
            day: date_time.day(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

impl PartitionKey {
    pub fn object_key(&self, prefix: &str, file_name: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}/{}", self, file_name)
        } else {
            format!("{}/{}/{}", prefix, self, file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::partition::PartitionKey;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use std::str::FromStr;

    #[test]
    fn test_from_utc() {
        let date_time = DateTime::<Utc>::from_str("2020-12-01T15:00:00.0+00:00").unwrap();
        assert_eq!(
            PartitionKey::from(date_time),
            PartitionKey {
                year: 2020,
                month: 12,
                day: 1,
            }
        );
    }

    #[test]
    fn test_offset_timestamps_fold_into_utc_day() {
        // 08:30 in Tokyo is still the previous day in UTC.
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let local = tokyo.with_ymd_and_hms(2021, 1, 1, 8, 30, 0).unwrap();
        let key = PartitionKey::from(local.with_timezone(&Utc));
        assert_eq!(key.to_string(), "2020/12/31");
    }

    #[test]
    fn test_object_key() {
        let key = PartitionKey {
            year: 2025,
            month: 3,
            day: 7,
        };
        assert_eq!(
            key.object_key("reports", "instances.csv"),
            "reports/2025/03/07/instances.csv"
        );
        assert_eq!(
            key.object_key("/reports/daily/", "instances.csv"),
            "reports/daily/2025/03/07/instances.csv"
        );
        assert_eq!(key.object_key("", "instances.csv"), "2025/03/07/instances.csv");
    }
}
