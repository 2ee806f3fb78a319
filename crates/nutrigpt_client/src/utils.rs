//! Date helpers shared by the cache and the prompts.

use chrono::{Datelike, NaiveDate, Weekday};

/// Locale-independent calendar-day key, `DD/MM/YYYY`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Long pt-BR date such as "segunda-feira, 19 de outubro".
pub fn long_date_pt_br(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    };
    const MONTHS: [&str; 12] = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
        "setembro", "outubro", "novembro", "dezembro",
    ];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday}, {} de {month}", date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_zero_padded_day_month_year() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_key(d), "07/03/2026");
    }

    #[test]
    fn date_key_differs_across_days() {
        let a = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let b = a.succ_opt().unwrap();
        assert_ne!(date_key(a), date_key(b));
    }

    #[test]
    fn long_date_in_portuguese() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(long_date_pt_br(d), "segunda-feira, 19 de outubro");
    }
}
