//! VPLanet option metadata from `vplanet -H`.

use std::collections::HashMap;
use std::process::Command;

/// Metadata for one VPLanet input option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionHelp {
    /// Option type (`Double`, `Integer`, `String`, `String-Array`, ...)
    pub kind: Option<String>,
    /// Unit used when the value is negative
    pub custom_unit: Option<String>,
    /// Physical dimension, e.g. `mass` or `length^3*time^-2`
    pub dimension: Option<String>,
    /// Default value
    pub default_value: Option<String>,
}

impl OptionHelp {
    /// Create metadata with a type and dimension.
    pub fn new(kind: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            dimension: Some(dimension.into()),
            ..Self::default()
        }
    }

    /// Set the custom (negative value) unit.
    pub fn with_custom_unit(mut self, unit: impl Into<String>) -> Self {
        self.custom_unit = Some(unit.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Option name to metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VplanetHelp {
    options: HashMap<String, OptionHelp>,
}

impl VplanetHelp {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `vplanet -H` and parse its output.
    ///
    /// If VPLanet cannot be run, a warning is logged and empty metadata is
    /// returned; units then fall back to `nd`.
    pub fn from_vplanet() -> Self {
        match Command::new("vplanet").arg("-H").output() {
            Ok(output) if output.status.success() => {
                Self::parse(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                log::warn!("vplanet -H exited with {}", output.status);
                Self::new()
            }
            Err(e) => {
                log::warn!("Unable to run vplanet -H: {}", e);
                Self::new()
            }
        }
    }

    /// Parse help text.
    pub fn parse(text: &str) -> Self {
        let mut help = Self::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            if line.contains("Output Parameters") {
                break;
            }

            let cells: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            let Some(first) = cells.first() else {
                continue;
            };

            if let Some(name) = header_name(first) {
                help.options.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(name) = current.as_ref() else {
                continue;
            };
            if cells.len() < 2 {
                continue;
            }
            let value = cells[cells.len() - 1].to_string();
            let Some(entry) = help.options.get_mut(name) else {
                continue;
            };

            if first.starts_with("Type") {
                entry.kind = Some(value);
            } else if first.starts_with("Custom unit") {
                entry.custom_unit = Some(value);
            } else if first.starts_with("Dimension") {
                entry.dimension = Some(value);
            } else if first.starts_with("Default value") {
                entry.default_value = Some(value);
            }
        }

        help
    }

    /// Add or replace an option.
    pub fn insert(&mut self, name: impl Into<String>, option: OptionHelp) {
        self.options.insert(name.into(), option);
    }

    /// Look up an option.
    pub fn get(&self, name: &str) -> Option<&OptionHelp> {
        self.options.get(name)
    }

    /// Whether the option holds strings rather than numbers.
    pub fn is_string(&self, name: &str) -> bool {
        matches!(
            self.get(name).and_then(|o| o.kind.as_deref()),
            Some("String") | Some("String-Array")
        )
    }

    /// Default value of an option.
    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|o| o.default_value.as_deref())
    }

    /// Number of known options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether no options are known.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// `**dMass**` -> `dMass` for option headers.
fn header_name(cell: &str) -> Option<String> {
    let name = cell.strip_prefix("**")?.strip_suffix("**")?.trim();
    let valid = !name.is_empty()
        && !name.contains(char::is_whitespace)
        && name.starts_with(['b', 'd', 'i', 's']);
    valid.then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELP: &str = "\
+------------------+---------------------------+
| **dMass**        |                           |
+------------------+---------------------------+
| Type             || Double                   |
| Custom unit      || Mearth                   |
| Dimension(s)     || mass                     |
| Default value    || 1                        |
+------------------+---------------------------+
| **sName**        |                           |
| Type             || String                   |
| Dimension(s)     || nd                       |
+------------------+---------------------------+
| **sUnitMass**    |                           |
| Type             || String                   |
| Default value    || kg                       |
Output Parameters
| **dLater**       |                           |
| Type             || Double                   |
";

    #[test]
    fn test_parse_help_table() {
        let help = VplanetHelp::parse(HELP);
        assert_eq!(help.len(), 3);

        let mass = help.get("dMass").unwrap();
        assert_eq!(mass.kind.as_deref(), Some("Double"));
        assert_eq!(mass.custom_unit.as_deref(), Some("Mearth"));
        assert_eq!(mass.dimension.as_deref(), Some("mass"));
        assert_eq!(mass.default_value.as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_stops_at_output_parameters() {
        let help = VplanetHelp::parse(HELP);
        assert!(help.get("dLater").is_none());
    }

    #[test]
    fn test_is_string() {
        let help = VplanetHelp::parse(HELP);
        assert!(help.is_string("sName"));
        assert!(!help.is_string("dMass"));
        assert!(!help.is_string("dUnknown"));
        assert_eq!(help.default_value("sUnitMass"), Some("kg"));
    }

    #[test]
    fn test_insert() {
        let mut help = VplanetHelp::new();
        help.insert(
            "dSemi",
            OptionHelp::new("Double", "length").with_custom_unit("AU"),
        );
        assert_eq!(help.get("dSemi").unwrap().custom_unit.as_deref(), Some("AU"));
    }

    #[test]
    fn test_header_name() {
        assert_eq!(header_name("**bDoForward**"), Some("bDoForward".to_string()));
        assert_eq!(header_name("**Output**"), None);
        assert_eq!(header_name("dMass"), None);
    }
}
