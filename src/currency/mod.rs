//! Multi-currency price conversion.
//!
//! Listing prices are stored in USD and converted at render time with a
//! process-wide [`RateTable`] kept fresh by [`RateService`].

pub mod format;
pub mod rates;

pub use format::{format, format_rate, format_with, price_display, PriceDisplay};
pub use rates::{HttpRateSource, RateService, RateSnapshot, RateSource, RateStatus, RatesResponse};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Brl,
    Pyg,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Brl => "BRL",
            Currency::Pyg => "PYG",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Brl => "R$",
            Currency::Pyg => "₲",
        }
    }

    /// Decimal places shown; guaraní has no cents in common use
    pub fn fraction_digits(&self) -> usize {
        match self {
            Currency::Pyg => 0,
            Currency::Usd | Currency::Brl => 2,
        }
    }
}

/// UI locale, which also decides the local display currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "es-PY")]
    EsPy,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::EsPy => "es-PY",
            Locale::EnUs => "en-US",
        }
    }

    pub fn local_currency(&self) -> Currency {
        match self {
            Locale::PtBr => Currency::Brl,
            Locale::EsPy => Currency::Pyg,
            Locale::EnUs => Currency::Usd,
        }
    }

    /// (thousands, decimal) separators
    pub fn separators(&self) -> (char, char) {
        match self {
            Locale::PtBr | Locale::EsPy => ('.', ','),
            Locale::EnUs => (',', '.'),
        }
    }

    /// Guess from the client's language tag and time zone.
    pub fn detect(language: &str, timezone: &str) -> Self {
        if language.to_lowercase().starts_with("es") || timezone.contains("Asuncion") {
            Locale::EsPy
        } else {
            Locale::PtBr
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt-br" | "pt" => Ok(Locale::PtBr),
            "es-py" | "es" => Ok(Locale::EsPy),
            "en-us" | "en" => Ok(Locale::EnUs),
            other => Err(format!("unsupported locale '{}'", other)),
        }
    }
}

/// USD-based exchange rates plus the derived PYG→BRL cross rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(rename = "USD_PYG")]
    pub usd_pyg: f64,
    #[serde(rename = "USD_BRL")]
    pub usd_brl: f64,
    #[serde(rename = "PYG_BRL")]
    pub pyg_brl: f64,
    #[serde(rename = "lastUpdate")]
    pub last_update: DateTime<Utc>,
}

impl RateTable {
    pub const BASELINE_USD_PYG: f64 = 7300.0;
    pub const BASELINE_USD_BRL: f64 = 5.2;

    /// Built-in reference values used before any fetch succeeds
    pub fn baseline(at: DateTime<Utc>) -> Self {
        Self::from_usd_rates(Self::BASELINE_USD_BRL, Self::BASELINE_USD_PYG, at)
    }

    pub fn from_usd_rates(usd_brl: f64, usd_pyg: f64, at: DateTime<Utc>) -> Self {
        Self {
            usd_pyg,
            usd_brl,
            pyg_brl: usd_brl / usd_pyg,
            last_update: at,
        }
    }

    /// How many units of `currency` one USD buys
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => 1.0,
            Currency::Brl => self.usd_brl,
            Currency::Pyg => self.usd_pyg,
        }
    }

    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_update > max_age
    }
}

/// Linear conversion from USD. No rounding happens here.
pub fn convert(usd_amount: f64, target: Currency, rates: &RateTable) -> f64 {
    usd_amount * rates.rate(target)
}

/// Inverse of [`convert`]
pub fn to_usd(amount: f64, from: Currency, rates: &RateTable) -> f64 {
    amount / rates.rate(from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RateTable {
        RateTable::from_usd_rates(5.43, 7312.5, Utc::now())
    }

    #[test]
    fn test_convert_is_linear() {
        let rates = table();
        assert!((convert(100.0, Currency::Brl, &rates) - 543.0).abs() < 1e-9);
        assert_eq!(convert(100.0, Currency::Usd, &rates), 100.0);
        assert_eq!(convert(0.0, Currency::Pyg, &rates), 0.0);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let rates = table();
        for usd in [0.01, 1.0, 99_999.99, 1_250_000.0] {
            for currency in [Currency::Usd, Currency::Brl, Currency::Pyg] {
                let back = to_usd(convert(usd, currency, &rates), currency, &rates);
                assert!((back - usd).abs() <= usd * 1e-12);
            }
        }
    }

    #[test]
    fn test_cross_rate_is_derived() {
        let rates = RateTable::baseline(Utc::now());
        assert!((rates.pyg_brl - 5.2 / 7300.0).abs() < 1e-12);
    }

    #[test]
    fn test_locale_parsing_and_detection() {
        assert_eq!("es-PY".parse::<Locale>(), Ok(Locale::EsPy));
        assert!("fr-FR".parse::<Locale>().is_err());
        assert_eq!(Locale::detect("es-ES", "Europe/Madrid"), Locale::EsPy);
        assert_eq!(Locale::detect("en-US", "America/Asuncion"), Locale::EsPy);
        assert_eq!(Locale::detect("pt-BR", "America/Sao_Paulo"), Locale::PtBr);
    }
}
