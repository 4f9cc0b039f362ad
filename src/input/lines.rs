//! Logical line splitting for VPLanet-style option files.

/// One logical option line: tokens after comment removal and `$` joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionLine {
    /// 1-based number of the physical line the option starts on
    pub number: usize,
    /// Whitespace-separated tokens; the first is the option name
    pub tokens: Vec<String>,
}

impl OptionLine {
    /// Option name.
    pub fn name(&self) -> &str {
        &self.tokens[0]
    }

    /// Values following the option name.
    pub fn values(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// First value, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.tokens.get(1).map(|s| s.as_str())
    }
}

/// Split file content into logical option lines.
///
/// `#` starts a comment, blank lines are skipped, and a `$` marks that the
/// value list continues on the next line.
pub fn option_lines(content: &str) -> Vec<OptionLine> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    let mut pending_start = 0;

    for (idx, raw) in content.lines().enumerate() {
        let mut line = raw.trim();
        if let Some((before, _)) = line.split_once('#') {
            line = before.trim_end();
        }
        if line.is_empty() {
            continue;
        }

        if pending.is_empty() {
            pending_start = idx + 1;
        }

        if let Some((before, _)) = line.split_once('$') {
            pending.push_str(before);
            pending.push(' ');
            continue;
        }

        pending.push_str(line);
        push_tokens(&mut lines, &pending, pending_start);
        pending.clear();
    }

    // A trailing `$` with nothing after it still yields its option.
    if !pending.trim().is_empty() {
        push_tokens(&mut lines, &pending, pending_start);
    }

    lines
}

fn push_tokens(lines: &mut Vec<OptionLine>, text: &str, number: usize) {
    let tokens: Vec<String> = text.split_whitespace().map(String::from).collect();
    if !tokens.is_empty() {
        lines.push(OptionLine { number, tokens });
    }
}

/// Find the first value of `option` in file content.
pub fn find_option(content: &str, option: &str) -> Option<String> {
    option_lines(content)
        .into_iter()
        .find(|l| l.name() == option)
        .and_then(|l| l.first_value().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blanks() {
        let content = "# header\n\nsName earth # inline\n   \ndMass -1.0\n";
        let lines = option_lines(content);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tokens, vec!["sName", "earth"]);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].first_value(), Some("-1.0"));
    }

    #[test]
    fn test_dollar_continuation() {
        let content = "first line $\nsecond line $\nthird line\n";
        let lines = option_lines(content);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].tokens,
            vec!["first", "line", "second", "line", "third", "line"]
        );
        assert_eq!(lines[0].number, 1);
    }

    #[test]
    fn test_find_option() {
        let content = "sSystemName\tearth\nsUnitMass kg\n";
        assert_eq!(find_option(content, "sUnitMass"), Some("kg".to_string()));
        assert_eq!(find_option(content, "sUnitTime"), None);
    }
}
