use std::fmt;

use serde::{Deserialize, Serialize};

/// Units expressed as "per 100 people" etc. are percentages in disguise.
const ALT_PERCENT: &str = "per 100";

// ---------------------------------------------------------------------------
// Symbol – how values of an indicator are decorated
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "$")]
    Dollar,
    #[serde(rename = "£")]
    Pound,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::Percent => "%",
            Symbol::Dollar => "$",
            Symbol::Pound => "£",
        }
    }

    /// Format a value for axis ticks and labels.
    ///
    /// Percentages are rounded and thousands-grouped (`1,234%`); currencies
    /// are prefixed and SI-abbreviated to two significant digits (`$1.5M`).
    pub fn format_value(self, value: f64) -> String {
        match self {
            Symbol::Percent => format!("{}%", group_thousands(value)),
            Symbol::Dollar | Symbol::Pound => format!("{}{}", self.as_str(), si_format(value)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a value for an indicator that may have no symbol.
pub fn format_value(symbol: Option<Symbol>, value: f64) -> String {
    match symbol {
        Some(symbol) => symbol.format_value(value),
        None => si_format(value),
    }
}

// ---------------------------------------------------------------------------
// IndicatorMetadata
// ---------------------------------------------------------------------------

/// Human-readable pieces of a composite indicator label such as
/// `GDP growth (annual %)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorMetadata {
    pub descriptor: String,
    pub unit: Option<String>,
    pub symbol: Option<Symbol>,
}

impl IndicatorMetadata {
    /// `descriptor (unit)`, or just the descriptor when there is no unit.
    pub fn label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} ({unit})", self.descriptor),
            None => self.descriptor.clone(),
        }
    }
}

/// Split an indicator key into descriptor, unit and symbol.
///
/// `descriptor [(unit)]`, e.g. `GDP growth (annual %)` or `Population, total`.
pub fn extract_metadata(key: &str) -> IndicatorMetadata {
    let (descriptor, unit) = match key.find('(') {
        Some(open) => {
            let rest = &key[open + 1..];
            let unit = rest.split(')').next().unwrap_or("").trim();
            (&key[..open], (!unit.is_empty()).then(|| unit.to_string()))
        }
        None => (key, None),
    };

    let symbol = unit.as_deref().and_then(detect_symbol);

    IndicatorMetadata {
        descriptor: descriptor.trim().to_string(),
        unit,
        symbol,
    }
}

fn detect_symbol(unit: &str) -> Option<Symbol> {
    if unit.contains('%') || unit.contains(ALT_PERCENT) {
        return Some(Symbol::Percent);
    }
    // First currency glyph wins.
    unit.chars().find_map(|c| match c {
        '$' => Some(Symbol::Dollar),
        '£' => Some(Symbol::Pound),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Number formatting helpers
// ---------------------------------------------------------------------------

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Round to an integer and insert `,` every three digits.
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Two significant digits with an SI prefix (`1.5M`, `42`, `500m`).
fn si_format(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value:.1}");
    }
    let magnitude = value.abs().log10().floor() as i32;
    let step = 10f64.powi(magnitude - 1);
    let rounded = (value / step).round() * step;

    let exponent = rounded.abs().log10().floor() as i32;
    let group = exponent.div_euclid(3).clamp(-8, 8);
    let scaled = rounded / 10f64.powi(group * 3);
    let decimals = (1 - (exponent - group * 3)).max(0) as usize;
    let prefix = SI_PREFIXES[(group + 8) as usize];
    format!("{scaled:.decimals$}{prefix}")
}
