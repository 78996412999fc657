use crate::currency::{convert, Currency, Locale, RateTable};
use serde::Serialize;

/// Group the integer part of a non-negative decimal string.
fn group_digits(digits: &str, thousands: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(thousands);
        }
        out.push(ch);
    }
    out
}

/// Plain number with locale grouping and a fixed number of decimals.
pub fn format_number(amount: f64, locale: Locale, fraction_digits: usize) -> String {
    let (thousands, decimal) = locale.separators();
    let fixed = format!("{:.*}", fraction_digits, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // "-0" after rounding is just zero
    if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, thousands));
    if let Some(frac) = frac_part {
        out.push(decimal);
        out.push_str(frac);
    }
    out
}

/// Currency string with an explicit number of decimals
pub fn format_with(amount: f64, currency: Currency, locale: Locale, fraction_digits: usize) -> String {
    let number = format_number(amount, locale, fraction_digits);
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number.as_str()),
    };
    match locale {
        Locale::EnUs => format!("{}{}{}", sign, currency.symbol(), digits),
        Locale::PtBr | Locale::EsPy => format!("{}{} {}", sign, currency.symbol(), digits),
    }
}

/// Currency string using the currency's usual number of decimals
pub fn format(amount: f64, currency: Currency, locale: Locale) -> String {
    format_with(amount, currency, locale, currency.fraction_digits())
}

/// Exchange rates span several orders of magnitude, so precision adapts.
pub fn format_rate(rate: f64, locale: Locale) -> String {
    if rate < 1.0 {
        format_number(rate, locale, 6)
    } else if rate < 100.0 {
        format_number(rate, locale, 2)
    } else {
        format_number(rate.round(), locale, 0)
    }
}

/// What a listing card shows for a price
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PriceDisplay {
    OnRequest,
    Priced {
        /// In the locale's currency
        local: String,
        /// Whole US dollars
        usd: String,
    },
}

impl std::fmt::Display for PriceDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceDisplay::OnRequest => f.write_str("Price on request"),
            PriceDisplay::Priced { local, usd } if local == usd => f.write_str(local),
            PriceDisplay::Priced { local, usd } => write!(f, "{} ({})", local, usd),
        }
    }
}

pub fn price_display(usd_price: Option<f64>, locale: Locale, rates: &RateTable) -> PriceDisplay {
    let Some(usd_price) = usd_price.filter(|p| *p > 0.0) else {
        return PriceDisplay::OnRequest;
    };

    let currency = locale.local_currency();
    let usd = format_with(usd_price, Currency::Usd, Locale::EnUs, 0);
    let local = if currency == Currency::Usd {
        usd.clone()
    } else {
        format(convert(usd_price, currency, rates), currency, locale)
    };
    PriceDisplay::Priced { local, usd }
}
