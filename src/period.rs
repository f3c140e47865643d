use crate::{error::InvalidRequest, FireChangeResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Date format of period boundaries and FIRMS acquisition dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A labeled range of dates that fire observations were grouped under.
///
/// The change detector never looks inside a period, it only hands it back with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
    pub label: String,
}

impl Period {
    pub fn new<S: Into<String>>(start_date: S, end_date: S, label: S) -> Self {
        Period {
            start_date: start_date.into(),
            end_date: end_date.into(),
            label: label.into(),
        }
    }

    /// Parse the start and end dates.
    pub fn date_range(&self) -> FireChangeResult<(NaiveDate, NaiveDate)> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;

        if end < start {
            return Err(InvalidRequest::new(format!(
                "Period '{}' ends ({}) before it starts ({}).",
                self.label, self.end_date, self.start_date
            ))
            .into());
        }

        Ok((start, end))
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} ({} to {})", self.label, self.start_date, self.end_date)
    }
}

impl FromStr for Period {
    type Err = Box<dyn std::error::Error>;

    /// Parse `start,end[,label]`. Without a label one is made from the dates.
    fn from_str(period_str: &str) -> Result<Self, Self::Err> {
        let mut parts = period_str.splitn(3, ',').map(str::trim);

        let start = parts.next().unwrap_or("");
        let end = parts.next().ok_or_else(|| {
            InvalidRequest::new(format!(
                "Invalid period, expected start,end[,label]: {}",
                period_str
            ))
        })?;

        let label = match parts.next() {
            Some(label) if !label.is_empty() => label.to_owned(),
            _ => format!("{} to {}", start, end),
        };

        let period = Period::new(start.to_owned(), end.to_owned(), label);
        period.date_range()?;

        Ok(period)
    }
}

/// Parse a YYYY-MM-DD date.
pub fn parse_date(date: &str) -> FireChangeResult<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|err| {
        InvalidRequest::new(format!("Invalid date '{}', expected YYYY-MM-DD: {}", date, err))
            .into()
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_date_range() {
        let p = Period::new("2024-01-01", "2024-01-07", "week one");
        let (start, end) = p.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());

        let backwards = Period::new("2024-01-07", "2024-01-01", "backwards");
        assert!(backwards.date_range().is_err());

        let garbage = Period::new("last tuesday", "2024-01-01", "garbage");
        assert!(garbage.date_range().is_err());
    }

    #[test]
    fn test_from_str() {
        let p: Period = "2024-01-01, 2024-01-07, week one".parse().unwrap();
        assert_eq!(p, Period::new("2024-01-01", "2024-01-07", "week one"));

        let p: Period = "2024-01-08,2024-01-14".parse().unwrap();
        assert_eq!(p.label, "2024-01-08 to 2024-01-14");

        let p: Period = "2024-01-08,2024-01-14,smoke, and more smoke".parse().unwrap();
        assert_eq!(p.label, "smoke, and more smoke");

        assert!("2024-01-08".parse::<Period>().is_err());
        assert!("2024-01-14,2024-01-08".parse::<Period>().is_err());
    }

    #[test]
    fn test_wire_names() {
        let p = Period::new("2024-01-01", "2024-01-07", "week one");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"startDate":"2024-01-01","endDate":"2024-01-07","label":"week one"}"#
        );
    }
}
