//! Dataset values.

use serde::{Deserialize, Deserializer, Serialize};

/// One stored value of a dataset.
///
/// A dataset collects one value per simulation (or per occurrence inside a
/// simulation), so a forward dataset holds one `Series` per trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Scalar number
    Number(#[serde(deserialize_with = "nullable_number")] f64),
    /// Non-numeric option value
    Text(String),
    /// Time series column
    Series(#[serde(deserialize_with = "nullable_series")] Vec<f64>),
    /// Two-dimensional grid (seasonal climate files)
    Matrix(#[serde(deserialize_with = "nullable_matrix")] Vec<Vec<f64>>),
    /// Output order entries: (variable, units)
    Pairs(Vec<(String, String)>),
}

impl Value {
    /// Interpret a raw token: numbers become `Number`, anything else `Text`.
    pub fn from_token(token: &str) -> Self {
        match parse_number(token) {
            Some(n) => Value::Number(n),
            None => Value::Text(token.to_string()),
        }
    }

    /// Scalar numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Borrow the series, if this is one.
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Value::Series(s) => Some(s),
            _ => None,
        }
    }

    /// All numbers contained in this value, flattened.
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            Value::Number(n) => vec![*n],
            Value::Text(s) => parse_number(s).into_iter().collect(),
            Value::Series(s) => s.clone(),
            Value::Matrix(m) => m.iter().flatten().copied().collect(),
            Value::Pairs(_) => Vec::new(),
        }
    }

    /// Text cells for delimited output.
    pub fn cells(&self) -> Vec<String> {
        match self {
            Value::Number(n) => vec![format_number(*n)],
            Value::Text(s) => vec![s.clone()],
            Value::Series(s) => s.iter().map(|n| format_number(*n)).collect(),
            Value::Matrix(m) => m
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|n| format_number(*n))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect(),
            Value::Pairs(p) => p.iter().map(|(v, u)| format!("{}[{}]", v, u)).collect(),
        }
    }
}

// JSON has no NaN; serde_json writes it as null.
fn nullable_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

fn nullable_series<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    let raw = Vec::<Option<f64>>::deserialize(d)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn nullable_matrix<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<f64>>, D::Error> {
    let raw = Vec::<Vec<Option<f64>>>::deserialize(d)?;
    Ok(raw
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        .collect())
}

/// Parse a number the way VPLanet writes them (`1.0e24`, `-1`, `3.2D+02`).
pub fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "e").parse::<f64>().ok())
}

/// Format a number for text output.
///
/// Integral values keep a trailing `.0`; very large or very small
/// magnitudes use scientific notation with a signed two-digit exponent.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string().to_lowercase();
    }
    let abs = n.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{:e}", n);
        if let Some((mantissa, exp)) = sci.split_once('e') {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
        return sci;
    }
    if n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// A named dataset: units plus one value per occurrence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Units attribute (`nd` when dimensionless)
    pub units: String,
    /// Stored values
    pub values: Vec<Value>,
}

impl Dataset {
    /// Create an empty dataset with units.
    pub fn new(units: impl Into<String>) -> Self {
        Self {
            units: units.into(),
            values: Vec::new(),
        }
    }

    /// Create a dataset holding one value.
    pub fn with_value(units: impl Into<String>, value: Value) -> Self {
        Self {
            units: units.into(),
            values: vec![value],
        }
    }

    /// Append a value.
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the dataset has no values yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
