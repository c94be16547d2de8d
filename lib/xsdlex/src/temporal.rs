//! Date and time lexical spaces, parsed with [`oxsdatatypes`].

use oxsdatatypes::{Date, DateTime, Duration, GYear, GYearMonth, Time};
use std::str::FromStr;

/// [`xsd:dateTime`](https://www.w3.org/TR/xmlschema11-2/#dateTime)
pub fn validate_date_time(value: &str) -> bool {
    DateTime::from_str(value).is_ok()
}

/// [`xsd:dateTimeStamp`](https://www.w3.org/TR/xmlschema11-2/#dateTimeStamp)
///
/// Same as `xsd:dateTime` but the timezone is mandatory.
pub fn validate_date_time_stamp(value: &str) -> bool {
    DateTime::from_str(value).is_ok_and(|date_time| date_time.timezone_offset().is_some())
}

/// [`xsd:date`](https://www.w3.org/TR/xmlschema11-2/#date)
pub fn validate_date(value: &str) -> bool {
    Date::from_str(value).is_ok()
}

/// [`xsd:time`](https://www.w3.org/TR/xmlschema11-2/#time)
pub fn validate_time(value: &str) -> bool {
    Time::from_str(value).is_ok()
}

/// [`xsd:gYear`](https://www.w3.org/TR/xmlschema11-2/#gYear)
pub fn validate_g_year(value: &str) -> bool {
    GYear::from_str(value).is_ok()
}

/// [`xsd:gYearMonth`](https://www.w3.org/TR/xmlschema11-2/#gYearMonth)
pub fn validate_g_year_month(value: &str) -> bool {
    GYearMonth::from_str(value).is_ok()
}

/// [`xsd:duration`](https://www.w3.org/TR/xmlschema11-2/#duration)
pub fn validate_duration(value: &str) -> bool {
    Duration::from_str(value).is_ok()
}
