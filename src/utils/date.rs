use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Lagringsformat för datum i databasen
pub const DB_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse ett datum från en sträng (flexibelt format)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d",    // 2024-01-15
        "%Y/%m/%d",    // 2024/01/15
        "%d-%m-%Y",    // 15-01-2024
        "%d/%m/%Y",    // 15/01/2024
        "%Y%m%d",      // 20240115
    ];

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    None
}

/// Parse ett datum lagrat i databasen. Tål även "YYYY-MM-DD HH:MM:SS".
pub fn parse_db_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().get(..10).unwrap_or(s.trim());
    NaiveDate::parse_from_str(date_part, DB_DATE_FORMAT).ok()
}

/// Formatera ett datum för visning och lagring
pub fn format_date(date: NaiveDate) -> String {
    date.format(DB_DATE_FORMAT).to_string()
}

/// Kompakt format för filnamn (20240115)
pub fn format_date_compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Närmaste fredag på eller efter datumet (standardvärde för veckoslut)
pub fn week_ending_for(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let friday = Weekday::Fri.num_days_from_monday() as i64;
    let offset = (friday - from_monday).rem_euclid(7);
    date + Duration::days(offset)
}

/// Antal dagar mellan två datum (kan vara negativt)
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("invalid"), None);
    }

    #[test]
    fn test_parse_db_date_with_time() {
        assert_eq!(parse_db_date("2024-03-08 00:00:00"), Some(d(2024, 3, 8)));
        assert_eq!(parse_db_date("2024-03-08"), Some(d(2024, 3, 8)));
        assert_eq!(parse_db_date("08.03"), None);
    }

    #[test]
    fn test_week_ending_for() {
        // Måndag 4 mars 2024 -> fredag 8 mars
        assert_eq!(week_ending_for(d(2024, 3, 4)), d(2024, 3, 8));
        assert_eq!(week_ending_for(d(2024, 3, 8)), d(2024, 3, 8));
        // Lördag -> nästa fredag
        assert_eq!(week_ending_for(d(2024, 3, 9)), d(2024, 3, 15));
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_date_compact(d(2024, 1, 5)), "20240105");
        assert_eq!(days_between(d(2024, 1, 1), d(2024, 1, 11)), 10);
    }
}
