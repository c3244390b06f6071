use chrono::NaiveDate;

use crate::process::utils::clean_str;

/// Parse `"MM/DD/YYYY"` (leading zeros optional) into a calendar date.
/// The year must have exactly four digits; `%Y` alone would read "21" as
/// year 21.
pub fn parse_mdy(s: &str) -> Option<NaiveDate> {
    let s = clean_str(s);
    let year = s.rsplit('/').next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

/// Days since the Unix epoch, as stored in an Arrow `Date32`.
pub fn to_date32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}
