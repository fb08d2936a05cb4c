//! Public suffix list parser
//!
//! Turns `public_suffix_list.dat` text into normalized rule strings. Each line
//! is read only up to its first whitespace, `//` lines are comments, and a
//! leading `!` exception marker is dropped.

/// How a rule was written in the source list.
///
/// Only used for statistics: exception rules are stored and matched as plain
/// rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// `co.uk`
    Plain,
    /// `*.ck`
    Wildcard,
    /// `!www.ck`
    Exception,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// Normalized rule text, as stored in the snapshot.
    pub rule: String,
    pub kind: RuleKind,
    /// 1-based source line.
    pub line: usize,
}

pub fn parse_rule_list(text: &str) -> Vec<ParsedRule> {
    let mut rules = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        if let Some((rule, kind)) = parse_rule_line(raw_line) {
            rules.push(ParsedRule {
                rule: rule.to_string(),
                kind,
                line: index + 1,
            });
        }
    }

    log::debug!("parsed {} rules from {} bytes", rules.len(), text.len());
    rules
}

/// Normalize a single source line. Returns `None` for blank and comment lines.
pub fn parse_rule_line(line: &str) -> Option<(&str, RuleKind)> {
    let token = line.split(char::is_whitespace).next().unwrap_or("");
    if token.is_empty() || is_comment_line(token) {
        return None;
    }

    let (token, kind) = match token.strip_prefix('!') {
        Some(rest) => (rest, RuleKind::Exception),
        None if token.starts_with("*.") => (token, RuleKind::Wildcard),
        None => (token, RuleKind::Plain),
    };

    let rule = token.trim_matches('.');
    if rule.is_empty() {
        log::warn!("ignoring empty rule {:?}", line);
        return None;
    }

    Some((rule, kind))
}

fn is_comment_line(token: &str) -> bool {
    token.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(text: &str) -> Vec<String> {
        parse_rule_list(text).into_iter().map(|r| r.rule).collect()
    }

    #[test]
    fn parses_plain_wildcard_and_exception_rules() {
        let parsed = parse_rule_list("com\n*.ck\n!www.ck\n");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].rule, "com");
        assert_eq!(parsed[0].kind, RuleKind::Plain);
        assert_eq!(parsed[1].rule, "*.ck");
        assert_eq!(parsed[1].kind, RuleKind::Wildcard);
        assert_eq!(parsed[2].rule, "www.ck");
        assert_eq!(parsed[2].kind, RuleKind::Exception);
        assert_eq!(parsed[2].line, 3);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let with_noise = "// ===BEGIN ICANN DOMAINS===\n\ncom\n// comment\n   \nuk\n\nco.uk\n";
        let without = "com\nuk\nco.uk\n";
        assert_eq!(rules(with_noise), rules(without));
        assert_eq!(rules(without), ["com", "uk", "co.uk"]);
    }

    #[test]
    fn reads_only_up_to_first_whitespace() {
        assert_eq!(rules("com extra words\nnet\tcomment"), ["com", "net"]);
    }

    #[test]
    fn leading_whitespace_line_is_skipped() {
        assert_eq!(rules("  com\nnet"), ["net"]);
    }

    #[test]
    fn single_slash_is_not_a_comment() {
        assert_eq!(rules("/weird\n//real comment"), ["/weird"]);
    }

    #[test]
    fn strips_only_one_exclamation_mark() {
        assert_eq!(rules("!!odd.ck"), ["!odd.ck"]);
    }

    #[test]
    fn trims_outer_dots_and_drops_empty_rules() {
        assert_eq!(rules(".com.\n!\n.\n"), ["com"]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        assert_eq!(rules("com\r\n// c\r\nco.uk\r\n"), ["com", "co.uk"]);
    }

    #[test]
    fn keeps_duplicates_for_optimizer() {
        assert_eq!(rules("com\ncom\n!com"), ["com", "com", "com"]);
    }

    #[test]
    fn parse_rule_line_cases() {
        assert_eq!(parse_rule_line("jp"), Some(("jp", RuleKind::Plain)));
        assert_eq!(parse_rule_line("!city.kawasaki.jp"), Some(("city.kawasaki.jp", RuleKind::Exception)));
        assert_eq!(parse_rule_line("// jp"), None);
        assert_eq!(parse_rule_line(""), None);
    }
}
