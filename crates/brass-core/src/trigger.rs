//! Trigger categories and text matching.
//!
//! Each [`Trigger`] value is one dispatch condition. A handler that declares
//! several categories receives one binding per category, each carrying its
//! own `Trigger`.

use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::event::Event;

/// The condition class that activated a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    FullMatch,
    Keyword,
    Command,
    Prefix,
    Suffix,
    Regex,
    Notice,
}

impl TriggerKind {
    /// Returns the configuration name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullMatch => "full_match",
            Self::Keyword => "keyword",
            Self::Command => "command",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Regex => "regex",
            Self::Notice => "notice",
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a successful trigger match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Which category matched.
    pub kind: TriggerKind,
    /// The pattern that matched (empty for notices).
    pub pattern: String,
    /// Text left over after the command, prefix or suffix.
    pub args: String,
    /// Regex capture groups, group 0 first. Empty for other categories.
    pub captures: Vec<Option<String>>,
}

impl TriggerMatch {
    /// Creates a match with no arguments or captures.
    pub fn new(kind: TriggerKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            args: String::new(),
            captures: Vec::new(),
        }
    }

    fn with_args(mut self, args: &str) -> Self {
        self.args = args.trim().to_string();
        self
    }
}

/// One dispatch condition.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// The whole (trimmed) message equals one of the strings.
    FullMatch(Vec<String>),
    /// The message contains one of the strings.
    Keyword(Vec<String>),
    /// The message is `<command prefix><command>` optionally followed by arguments.
    Command(Vec<String>),
    /// The message starts with one of the strings.
    Prefix(Vec<String>),
    /// The message ends with one of the strings.
    Suffix(Vec<String>),
    /// The message matches the expression.
    Regex(Regex),
    /// The event is a notice.
    Notice,
}

impl Trigger {
    /// Compiles a regex trigger.
    pub fn regex(pattern: &str) -> CoreResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| CoreError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns the category of this trigger.
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::FullMatch(_) => TriggerKind::FullMatch,
            Self::Keyword(_) => TriggerKind::Keyword,
            Self::Command(_) => TriggerKind::Command,
            Self::Prefix(_) => TriggerKind::Prefix,
            Self::Suffix(_) => TriggerKind::Suffix,
            Self::Regex(_) => TriggerKind::Regex,
            Self::Notice => TriggerKind::Notice,
        }
    }

    /// Returns the patterns this trigger was built from.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::FullMatch(p)
            | Self::Keyword(p)
            | Self::Command(p)
            | Self::Prefix(p)
            | Self::Suffix(p) => p.iter().map(String::as_str).collect(),
            Self::Regex(re) => vec![re.as_str()],
            Self::Notice => Vec::new(),
        }
    }

    /// Tests the trigger against an event.
    ///
    /// `command_prefix` is only consulted by [`Trigger::Command`].
    pub fn matches(&self, event: &Event, command_prefix: &str) -> Option<TriggerMatch> {
        if let Self::Notice = self {
            return event
                .is_notice()
                .then(|| TriggerMatch::new(TriggerKind::Notice, ""));
        }
        if !event.is_message() {
            return None;
        }

        let text = event.text.as_str();
        let kind = self.kind();
        match self {
            Self::FullMatch(patterns) => patterns
                .iter()
                .find(|p| text.trim() == p.as_str())
                .map(|p| TriggerMatch::new(kind, p.as_str())),
            Self::Keyword(patterns) => patterns
                .iter()
                .find(|p| text.contains(p.as_str()))
                .map(|p| TriggerMatch::new(kind, p.as_str()).with_args(text)),
            Self::Command(commands) => {
                let rest = text.trim_start().strip_prefix(command_prefix)?;
                commands.iter().find_map(|cmd| {
                    let args = rest.strip_prefix(cmd.as_str())?;
                    (args.is_empty() || args.starts_with(char::is_whitespace))
                        .then(|| TriggerMatch::new(kind, cmd.as_str()).with_args(args))
                })
            }
            Self::Prefix(patterns) => patterns.iter().find_map(|p| {
                text.strip_prefix(p.as_str())
                    .map(|args| TriggerMatch::new(kind, p.as_str()).with_args(args))
            }),
            Self::Suffix(patterns) => patterns.iter().find_map(|p| {
                text.strip_suffix(p.as_str())
                    .map(|args| TriggerMatch::new(kind, p.as_str()).with_args(args))
            }),
            Self::Regex(re) => re.captures(text).map(|caps| {
                let mut matched = TriggerMatch::new(kind, re.as_str());
                matched.captures = caps
                    .iter()
                    .map(|c| c.map(|m| m.as_str().to_string()))
                    .collect();
                matched
            }),
            Self::Notice => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_match_trims() {
        let trigger = Trigger::FullMatch(strings(&["ping"]));
        assert!(trigger.matches(&Event::private(1, " ping "), "/").is_some());
        assert!(trigger.matches(&Event::private(1, "ping me"), "/").is_none());
    }

    #[test]
    fn test_keyword_contains() {
        let trigger = Trigger::Keyword(strings(&["hi"]));
        let matched = trigger.matches(&Event::private(1, "oh hi there"), "/").unwrap();
        assert_eq!(matched.kind, TriggerKind::Keyword);
        assert_eq!(matched.pattern, "hi");
    }

    #[test]
    fn test_command_requires_word_boundary() {
        let trigger = Trigger::Command(strings(&["echo"]));
        let matched = trigger.matches(&Event::private(1, "/echo hello world"), "/").unwrap();
        assert_eq!(matched.args, "hello world");

        assert!(trigger.matches(&Event::private(1, "/echo"), "/").is_some());
        assert!(trigger.matches(&Event::private(1, "/echoes"), "/").is_none());
        assert!(trigger.matches(&Event::private(1, "echo hi"), "/").is_none());
        assert!(trigger.matches(&Event::private(1, "#echo hi"), "#").is_some());
    }

    #[test]
    fn test_prefix_and_suffix_args() {
        let prefix = Trigger::Prefix(strings(&["tell me"]));
        let matched = prefix.matches(&Event::private(1, "tell me a joke"), "/").unwrap();
        assert_eq!(matched.args, "a joke");

        let suffix = Trigger::Suffix(strings(&["?"]));
        let matched = suffix.matches(&Event::private(1, "why "), "/");
        assert!(matched.is_none());
        let matched = suffix.matches(&Event::private(1, "why?"), "/").unwrap();
        assert_eq!(matched.args, "why");
    }

    #[test]
    fn test_regex_captures() {
        let trigger = Trigger::regex(r"^roll (\d+)d(\d+)$").unwrap();
        let matched = trigger.matches(&Event::private(1, "roll 2d6"), "/").unwrap();
        assert_eq!(
            matched.captures,
            vec![
                Some("roll 2d6".to_string()),
                Some("2".to_string()),
                Some("6".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let err = Trigger::regex("(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_notice_only_matches_notices() {
        let notice = Event::notice("group_increase", 1, Some(2));
        assert!(Trigger::Notice.matches(&notice, "/").is_some());
        assert!(Trigger::Notice.matches(&Event::private(1, "hi"), "/").is_none());
        assert!(
            Trigger::Keyword(strings(&[""]))
                .matches(&notice, "/")
                .is_none()
        );
    }
}
