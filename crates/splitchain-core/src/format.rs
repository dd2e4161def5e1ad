use chrono::{DateTime, Utc};

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64, currency: &str) -> String;
}

/// Formats timestamps for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: DateTime<Utc>) -> String;
}

/// Two-decimal amounts with thousands separators, e.g. `$1,234.50` or `-€3.00`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCurrencyFormatter;

impl CurrencyFormatter for StandardCurrencyFormatter {
    fn format_amount(&self, amount: f64, currency: &str) -> String {
        let sign = if amount < 0.0 { "-" } else { "" };
        let cents = (amount.abs() * 100.0).round() as u64;
        let whole = group_thousands(cents / 100);
        let fraction = cents % 100;
        match currency_symbol(currency) {
            Some(symbol) => format!("{sign}{symbol}{whole}.{fraction:02}"),
            None => format!("{sign}{whole}.{fraction:02} {}", currency.to_uppercase()),
        }
    }
}

/// `Jan 5, 2025` style dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortDateFormatter;

impl DateFormatter for ShortDateFormatter {
    fn format_date(&self, date: DateTime<Utc>) -> String {
        date.format("%b %-d, %Y").to_string()
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_usd_with_separators() {
        let fmt = StandardCurrencyFormatter;
        assert_eq!(fmt.format_amount(1234.5, "USD"), "$1,234.50");
        assert_eq!(fmt.format_amount(-3.0, "usd"), "-$3.00");
        assert_eq!(fmt.format_amount(0.0, "USD"), "$0.00");
        assert_eq!(fmt.format_amount(1_000_000.0, "DAI"), "1,000,000.00 DAI");
    }

    #[test]
    fn formats_short_dates() {
        let date = Utc.with_ymd_and_hms(2025, 1, 5, 18, 0, 0).unwrap();
        assert_eq!(ShortDateFormatter.format_date(date), "Jan 5, 2025");
    }
}
