//! Date search parameters with FHIR comparison prefixes.
//!
//! A date search value may carry a two-letter prefix naming the comparison, e.g.
//! `birthdate=ge2000-07-28`. See <https://build.fhir.org/search.html#prefix>.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Comparison prefix of a date search value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamPrefix {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEquals,
    LessThanOrEquals,
    /// The resource value starts after the search value.
    StartsAfter,
    /// The resource value ends before the search value.
    EndsBefore,
    /// The resource value is approximately the search value.
    Approximate,
}

impl ParamPrefix {
    const ALL: [ParamPrefix; 9] = [
        ParamPrefix::Equal,
        ParamPrefix::NotEqual,
        ParamPrefix::GreaterThan,
        ParamPrefix::LessThan,
        ParamPrefix::GreaterThanOrEquals,
        ParamPrefix::LessThanOrEquals,
        ParamPrefix::StartsAfter,
        ParamPrefix::EndsBefore,
        ParamPrefix::Approximate,
    ];

    /// The wire form of the prefix.
    pub fn value(self) -> &'static str {
        match self {
            ParamPrefix::Equal => "eq",
            ParamPrefix::NotEqual => "ne",
            ParamPrefix::GreaterThan => "gt",
            ParamPrefix::LessThan => "lt",
            ParamPrefix::GreaterThanOrEquals => "ge",
            ParamPrefix::LessThanOrEquals => "le",
            ParamPrefix::StartsAfter => "sa",
            ParamPrefix::EndsBefore => "eb",
            ParamPrefix::Approximate => "ap",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == value)
    }
}

impl fmt::Display for ParamPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// A date search value and its optional comparison prefix.
///
/// The value is held at calendar-day precision; a date-time value is reduced to the calendar
/// day it names in its own offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateParam {
    prefix: Option<ParamPrefix>,
    value: NaiveDate,
}

impl DateParam {
    pub fn new(prefix: Option<ParamPrefix>, value: NaiveDate) -> Self {
        Self { prefix, value }
    }

    /// Parses `[prefix]YYYY-MM-DD` or `[prefix]<RFC 3339 date-time>`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidDateParam`] if the prefix is unknown or the date is malformed.
    pub fn parse(raw: &str) -> FhirResult<Self> {
        let raw = raw.trim();

        let (prefix, rest) = match raw.get(..2) {
            Some(head) if head.chars().all(|c| c.is_ascii_alphabetic()) => {
                let prefix = ParamPrefix::from_value(head).ok_or_else(|| {
                    FhirError::InvalidDateParam(format!("unknown prefix '{head}' in '{raw}'"))
                })?;
                (Some(prefix), &raw[2..])
            }
            _ => (None, raw),
        };

        let value = NaiveDate::parse_from_str(rest, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(rest).map(|dt| dt.date_naive()))
            .map_err(|_| FhirError::InvalidDateParam(format!("invalid date '{rest}'")))?;

        Ok(Self { prefix, value })
    }

    /// The explicit prefix, if one was given.
    pub fn prefix(&self) -> Option<ParamPrefix> {
        self.prefix
    }

    pub fn value(&self) -> NaiveDate {
        self.value
    }
}

impl fmt::Display for DateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix {
            write!(f, "{prefix}")?;
        }
        write!(f, "{}", self.value.format("%Y-%m-%d"))
    }
}

impl FromStr for DateParam {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bare_date_has_no_prefix() {
        let param = DateParam::parse("2000-07-28").unwrap();
        assert_eq!(param.prefix(), None);
        assert_eq!(param.value(), day(2000, 7, 28));
    }

    #[test]
    fn parses_each_prefix() {
        for prefix in ParamPrefix::ALL {
            let param = DateParam::parse(&format!("{}2000-07-28", prefix.value())).unwrap();
            assert_eq!(param.prefix(), Some(prefix));
            assert_eq!(param.value(), day(2000, 7, 28));
        }
    }

    #[test]
    fn date_time_is_reduced_to_its_calendar_day() {
        let param = DateParam::parse("lt2000-07-28T23:30:00+05:00").unwrap();
        assert_eq!(param.prefix(), Some(ParamPrefix::LessThan));
        assert_eq!(param.value(), day(2000, 7, 28));
    }

    #[test]
    fn rejects_unknown_prefix_and_bad_dates() {
        assert!(matches!(
            DateParam::parse("xx2000-07-28"),
            Err(FhirError::InvalidDateParam(_))
        ));
        assert!(matches!(
            DateParam::parse("ge2000-02-30"),
            Err(FhirError::InvalidDateParam(_))
        ));
        assert!(matches!(DateParam::parse(""), Err(FhirError::InvalidDateParam(_))));
    }

    #[test]
    fn display_round_trips_wire_form() {
        assert_eq!(DateParam::parse("ne1999-01-02").unwrap().to_string(), "ne1999-01-02");
        assert_eq!(DateParam::parse("1999-01-02").unwrap().to_string(), "1999-01-02");
    }
}
