//! Dataset keys of the form `body:variable[:aggregation]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a dataset was produced, or which statistic to compute from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Aggregation {
    /// Value from the initial section of the log file
    Initial,
    /// Value from the final section of the log file
    Final,
    /// Value from an input (option) file
    Option,
    /// Time series from the forward evolution file
    Forward,
    /// Time series from the backward evolution file
    Backward,
    /// Series from the climate grid file
    Climate,
    /// Arithmetic mean of the forward series
    Mean,
    /// Most frequent value of the forward series
    Mode,
    /// Population standard deviation of the forward series
    StdDev,
    /// Minimum of the forward series
    Min,
    /// Maximum of the forward series
    Max,
    /// Geometric mean of the forward series
    GeoMean,
    /// Root mean square of the forward series
    Rms,
}

impl Aggregation {
    /// All statistics that can be derived from a forward series.
    pub const STATISTICS: [Aggregation; 7] = [
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Mean,
        Aggregation::Mode,
        Aggregation::GeoMean,
        Aggregation::StdDev,
        Aggregation::Rms,
    ];

    /// The suffix used in keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Initial => "initial",
            Aggregation::Final => "final",
            Aggregation::Option => "option",
            Aggregation::Forward => "forward",
            Aggregation::Backward => "backward",
            Aggregation::Climate => "climate",
            Aggregation::Mean => "mean",
            Aggregation::Mode => "mode",
            Aggregation::StdDev => "stddev",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::GeoMean => "geomean",
            Aggregation::Rms => "rms",
        }
    }

    /// Whether this aggregation is computed from the forward series.
    pub fn is_statistic(&self) -> bool {
        Self::STATISTICS.contains(self)
    }

    /// Whether the stored dataset is a time series.
    pub fn is_series(&self) -> bool {
        matches!(
            self,
            Aggregation::Forward | Aggregation::Backward | Aggregation::Climate
        )
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let agg = match s {
            "initial" => Aggregation::Initial,
            "final" => Aggregation::Final,
            "option" => Aggregation::Option,
            "forward" => Aggregation::Forward,
            "backward" => Aggregation::Backward,
            "climate" => Aggregation::Climate,
            "mean" => Aggregation::Mean,
            "mode" => Aggregation::Mode,
            "stddev" => Aggregation::StdDev,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "geomean" => Aggregation::GeoMean,
            "rms" => Aggregation::Rms,
            other => return Err(Error::UnknownAggregation(other.to_string())),
        };
        Ok(agg)
    }
}

/// A parsed dataset key.
///
/// Two-part keys (`earth:OutputOrder`, `earth:DailyInsol`) have no
/// aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    /// Body name, or `system` for system-wide log properties
    pub body: String,
    /// Variable (parameter) name
    pub variable: String,
    /// Aggregation suffix
    pub aggregation: Option<Aggregation>,
}

impl Key {
    /// Create a key with an aggregation.
    pub fn new(body: impl Into<String>, variable: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            body: body.into(),
            variable: variable.into(),
            aggregation: Some(aggregation),
        }
    }

    /// Create a two-part key.
    pub fn plain(body: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            variable: variable.into(),
            aggregation: None,
        }
    }

    /// Parse a key string.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [body, variable] if !body.is_empty() && !variable.is_empty() => {
                Ok(Self::plain(*body, *variable))
            }
            [body, variable, agg] if !body.is_empty() && !variable.is_empty() => {
                Ok(Self::new(*body, *variable, agg.parse()?))
            }
            _ => Err(Error::InvalidKey(s.to_string())),
        }
    }

    /// Whether this key names an output order list.
    pub fn is_order(&self) -> bool {
        self.aggregation.is_none()
            && (self.variable == "OutputOrder" || self.variable == "GridOutputOrder")
    }

    /// The key holding the data a statistic is computed from.
    ///
    /// Statistics read the forward series; every other key maps to itself.
    pub fn source(&self) -> Key {
        match self.aggregation {
            Some(agg) if agg.is_statistic() => {
                Key::new(self.body.clone(), self.variable.clone(), Aggregation::Forward)
            }
            _ => self.clone(),
        }
    }

    /// Same body and variable with another aggregation.
    pub fn with_aggregation(&self, aggregation: Aggregation) -> Key {
        Key::new(self.body.clone(), self.variable.clone(), aggregation)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregation {
            Some(agg) => write!(f, "{}:{}:{}", self.body, self.variable, agg),
            None => write!(f, "{}:{}", self.body, self.variable),
        }
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Key::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_part_key() {
        let key = Key::parse("earth:Obliquity:final").unwrap();
        assert_eq!(key.body, "earth");
        assert_eq!(key.variable, "Obliquity");
        assert_eq!(key.aggregation, Some(Aggregation::Final));
        assert_eq!(key.to_string(), "earth:Obliquity:final");
    }

    #[test]
    fn test_parse_two_part_key() {
        let key = Key::parse("earth:OutputOrder").unwrap();
        assert!(key.is_order());
        assert_eq!(key.to_string(), "earth:OutputOrder");
    }

    #[test]
    fn test_parse_unknown_aggregation() {
        let result = Key::parse("earth:TMan:median");
        assert!(matches!(result, Err(Error::UnknownAggregation(a)) if a == "median"));
    }

    #[test]
    fn test_parse_malformed_keys() {
        assert!(matches!(Key::parse("earth"), Err(Error::InvalidKey(_))));
        assert!(matches!(Key::parse("a:b:final:x"), Err(Error::InvalidKey(_))));
        assert!(matches!(Key::parse(":Mass:final"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_statistic_source_is_forward() {
        let key = Key::parse("earth:TMan:geomean").unwrap();
        assert_eq!(key.source().to_string(), "earth:TMan:forward");

        let key = Key::parse("earth:TMan:final").unwrap();
        assert_eq!(key.source(), key);
    }

    #[test]
    fn test_aggregation_classification() {
        assert!(Aggregation::Rms.is_statistic());
        assert!(!Aggregation::Forward.is_statistic());
        assert!(Aggregation::Climate.is_series());
        assert!(!Aggregation::Initial.is_series());
    }
}
