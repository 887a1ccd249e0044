use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US", alias = "en", alias = "en_US")]
    EnUs,
    #[serde(rename = "it-IT", alias = "it", alias = "it_IT")]
    ItIt,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::ItIt => "it-IT",
        }
    }

    pub fn currency_symbol(self) -> &'static str {
        match self {
            Locale::EnUs => "$",
            Locale::ItIt => "€",
        }
    }

    fn separators(self) -> (char, char) {
        match self {
            Locale::EnUs => (',', '.'),
            Locale::ItIt => ('.', ','),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Two fixed fraction digits with locale grouping, e.g. `1,234.50` or `1.234,50`.
pub fn format_decimal(value: f64, locale: Locale) -> String {
    let (group_sep, decimal_sep) = locale.separators();
    let cents = (value.abs() * 100.0).round();
    let fraction = (cents % 100.0) as u8;
    let digits = format!("{:.0}", (cents / 100.0).trunc());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{sign}{grouped}{decimal_sep}{fraction:02}")
}

pub mod keys {
    pub const CAPITAL_WITH_HIGHER_FEES: &str = "CAPITAL_WITH_HIGHER_FEES";
    pub const CAPITAL_WITH_BASE_FEES: &str = "CAPITAL_WITH_BASE_FEES";
    pub const CAPITAL_WITH_LOWER_FEES: &str = "CAPITAL_WITH_LOWER_FEES";
    pub const CAPITAL_FEES_TOOLTIP: &str = "CAPITAL_FEES_TOOLTIP";
    pub const YEARS_TO_DOUBLE: &str = "YEARS_TO_DOUBLE";
}

pub trait MessageCatalog: Send + Sync {
    fn template(&self, locale: Locale, key: &str) -> Option<&str>;

    fn message(&self, locale: Locale, key: &str, args: &[(&str, String)]) -> String {
        match self.template(locale, key) {
            Some(template) => interpolate(template, args),
            None => key.to_string(),
        }
    }
}

pub fn interpolate(template: &str, args: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match args.iter().find(|(k, _)| *k == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl MessageCatalog for BuiltinCatalog {
    fn template(&self, locale: Locale, key: &str) -> Option<&str> {
        let text = match (locale, key) {
            (Locale::EnUs, keys::CAPITAL_WITH_HIGHER_FEES) => "Capital with higher fees",
            (Locale::EnUs, keys::CAPITAL_WITH_BASE_FEES) => {
                "Capital with {{baseFeeRate}}% annual fees"
            }
            (Locale::EnUs, keys::CAPITAL_WITH_LOWER_FEES) => "Capital with lower fees",
            (Locale::EnUs, keys::CAPITAL_FEES_TOOLTIP) => {
                "After {{years}} years of compounding, fees have cost you:<br>\
                 {{lowerFeeRate}}% fees: {{currency}}{{lowerPrincipal}}<br>\
                 {{baseFeeRate}}% fees: {{currency}}{{basePrincipal}}<br>\
                 {{higherFeeRate}}% fees: {{currency}}{{higherPrincipal}}"
            }
            (Locale::EnUs, keys::YEARS_TO_DOUBLE) => {
                "After {{years}} years the fees you pay will have doubled relative to your gains"
            }
            (Locale::ItIt, keys::CAPITAL_WITH_HIGHER_FEES) => "Capitale con spese più alte",
            (Locale::ItIt, keys::CAPITAL_WITH_BASE_FEES) => {
                "Capitale con spese annue del {{baseFeeRate}}%"
            }
            (Locale::ItIt, keys::CAPITAL_WITH_LOWER_FEES) => "Capitale con spese più basse",
            (Locale::ItIt, keys::CAPITAL_FEES_TOOLTIP) => {
                "Dopo {{years}} anni di capitalizzazione, le spese ti sono costate:<br>\
                 spese al {{lowerFeeRate}}%: {{currency}}{{lowerPrincipal}}<br>\
                 spese al {{baseFeeRate}}%: {{currency}}{{basePrincipal}}<br>\
                 spese al {{higherFeeRate}}%: {{currency}}{{higherPrincipal}}"
            }
            (Locale::ItIt, keys::YEARS_TO_DOUBLE) => {
                "Dopo {{years}} anni le spese pagate saranno raddoppiate rispetto ai guadagni"
            }
            _ => return None,
        };
        Some(text)
    }
}
