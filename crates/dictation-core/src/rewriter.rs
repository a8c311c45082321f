//! Utterance rewriting.
//!
//! A [`RuleTable`] is an ordered list of [`Rule`]s. Matching an utterance walks the table in
//! order:
//!
//! - a **text rule** (no command id) rewrites every occurrence of its pattern in the
//!   utterance, and the rewritten utterance is what later rules see;
//! - a **command rule** fires only if its pattern matches the **entire** (rewritten)
//!   utterance. The first command rule that fires ends the walk and produces a command
//!   [`Rewrite`]. Command rules that do not match are skipped without effect.
//!
//! Replacement and argument templates refer to capture groups as `$1`, `$2`, …; a backslash
//! escapes the next character (`\$` is a literal dollar sign).
//!
//! # Example
//!
//! ```rust
//! use dictation_core::{Rule, RuleTable};
//!
//! let table = RuleTable::new(vec![
//!     Rule::text("old_word", "new_word").unwrap(),
//!     Rule::command("select (.*)", "", "select", ["$1"]).unwrap(),
//! ]);
//!
//! assert_eq!(table.rewrite("an old_word").text, "an new_word");
//!
//! let rewrite = table.rewrite("select some words");
//! assert_eq!(rewrite.command_id.as_deref(), Some("select"));
//! assert_eq!(rewrite.args, vec!["some words".to_string()]);
//! ```

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Errors produced while building rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A rule pattern failed to compile.
    #[error("regex compile error for pattern '{pattern}': {message}")]
    RegexCompile {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|err| RuleError::RegexCompile {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

/// A single rewrite rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    whole: Regex,
    replacement: String,
    command_id: Option<String>,
    args: Vec<String>,
}

impl Rule {
    /// A pure text rule: every match of `pattern` is replaced with `replacement`.
    pub fn text(pattern: &str, replacement: impl Into<String>) -> Result<Self, RuleError> {
        Self::build(pattern, replacement.into(), None, Vec::new())
    }

    /// A command rule: if `pattern` matches the whole utterance, the result is the command
    /// `command_id` with `args` (and `replacement` as the literal text to write first).
    pub fn command<I, S>(
        pattern: &str,
        replacement: impl Into<String>,
        command_id: impl Into<String>,
        args: I,
    ) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(
            pattern,
            replacement.into(),
            Some(command_id.into()),
            args.into_iter().map(Into::into).collect(),
        )
    }

    fn build(
        pattern: &str,
        replacement: String,
        command_id: Option<String>,
        args: Vec<String>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            pattern: compile(pattern)?,
            whole: compile(&format!("^(?:{pattern})$"))?,
            replacement,
            command_id,
            args,
        })
    }

    /// The rule's pattern source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The replacement template.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// The command id, for command rules.
    pub fn command_id(&self) -> Option<&str> {
        self.command_id.as_deref()
    }

    /// The argument templates.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns `true` for command rules.
    pub fn is_command(&self) -> bool {
        self.command_id.is_some()
    }
}

/// The result of matching an utterance against a [`RuleTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Literal text to write.
    pub text: String,
    /// Command to run after writing `text`, if any.
    pub command_id: Option<String>,
    /// Instantiated command arguments.
    pub args: Vec<String>,
}

impl Rewrite {
    /// A rewrite that is just literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            command_id: None,
            args: Vec::new(),
        }
    }

    /// Returns `true` if the rewrite carries a command.
    pub fn is_command(&self) -> bool {
        self.command_id.is_some()
    }
}

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command_id {
            Some(id) => write!(f, "{}({})", id, self.args.join(",")),
            None => f.write_str(&self.text),
        }
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Create a table from rules in priority order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// A table without rules; every utterance is literal text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match `utterance` against the table.
    pub fn rewrite(&self, utterance: &str) -> Rewrite {
        let mut current = Cow::Borrowed(utterance);

        for rule in &self.rules {
            let Some(command_id) = &rule.command_id else {
                let replaced = rule
                    .pattern
                    .replace_all(&current, |caps: &Captures<'_>| {
                        expand(&rule.replacement, caps)
                    })
                    .into_owned();
                current = Cow::Owned(replaced);
                continue;
            };

            if let Some(caps) = rule.whole.captures(&current) {
                let args: Vec<String> = rule.args.iter().map(|arg| expand(arg, &caps)).collect();
                tracing::debug!(
                    pattern = rule.pattern.as_str(),
                    command = command_id.as_str(),
                    ?args,
                    "utterance matched command rule"
                );
                return Rewrite {
                    text: expand(&rule.replacement, &caps),
                    command_id: Some(command_id.clone()),
                    args,
                };
            }
        }

        Rewrite::literal(current)
    }
}

impl FromIterator<Rule> for RuleTable {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Instantiate `template` with the groups of `caps`.
///
/// `$n` takes as many digits as still form a valid group number; groups that did not take
/// part in the match expand to nothing.
fn expand(template: &str, caps: &Captures<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let mut group = 0;
                while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                    let candidate = group * 10 + digit as usize;
                    if group != 0 && candidate >= caps.len() {
                        break;
                    }
                    group = candidate;
                    chars.next();
                    if group == 0 {
                        break;
                    }
                }
                if let Some(m) = caps.get(group) {
                    out.push_str(m.as_str());
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::new(vec![
            Rule::text("DELETE ME", "").unwrap(),
            Rule::text("old_word", "new_word").unwrap(),
            Rule::command("s/(.*)/(.*)/", "", "replace", ["$1", "$2"]).unwrap(),
            Rule::command("connect (.*) and (.*)", "", "replace", ["$1 $2", "$1-$2"]).unwrap(),
            Rule::command("delete (.+)", "", "delete", ["$1"]).unwrap(),
            Rule::command("delete2 (.*)", "D2", "replace", ["$1", ""]).unwrap(),
            Rule::command("underscore (.*)", "", "replace", ["$1", "_$1_"]).unwrap(),
            Rule::command("step back", "", "goBackward", Vec::<String>::new()).unwrap(),
        ])
    }

    #[test]
    fn test_no_match_is_literal() {
        let rewrite = table().rewrite("just some words");
        assert_eq!(rewrite, Rewrite::literal("just some words"));
        assert!(!rewrite.is_command());
    }

    #[test]
    fn test_text_rules_rewrite_every_occurrence() {
        let rewrite = table().rewrite("old_word and old_word");
        assert_eq!(rewrite.text, "new_word and new_word");
        assert_eq!(table().rewrite("DELETE ME").text, "");
    }

    #[test]
    fn test_command_requires_whole_utterance() {
        let rewrite = table().rewrite("I will delete something");
        assert!(!rewrite.is_command());
        assert_eq!(rewrite.text, "I will delete something");
    }

    #[test]
    fn test_command_args_are_instantiated() {
        let rewrite = table().rewrite("connect word1 and word2");
        assert_eq!(rewrite.command_id.as_deref(), Some("replace"));
        assert_eq!(rewrite.args, vec!["word1 word2", "word1-word2"]);
        assert_eq!(rewrite.text, "");
        assert_eq!(rewrite.to_string(), "replace(word1 word2,word1-word2)");
    }

    #[test]
    fn test_command_replacement_text() {
        let rewrite = table().rewrite("delete2 is_a");
        assert_eq!(rewrite.text, "D2");
        assert_eq!(rewrite.args, vec!["is_a", ""]);
    }

    #[test]
    fn test_group_followed_by_word_char() {
        let rewrite = table().rewrite("underscore some");
        assert_eq!(rewrite.args, vec!["some", "_some_"]);
    }

    #[test]
    fn test_first_matching_command_wins() {
        let table = RuleTable::new(vec![
            Rule::command("go (.*)", "", "first", ["$1"]).unwrap(),
            Rule::command("go (\\d+)", "", "second", ["$1"]).unwrap(),
        ]);
        assert_eq!(table.rewrite("go 12").command_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_malformed_pattern_fails_at_load() {
        let err = Rule::text("(unclosed", "x").unwrap_err();
        assert!(matches!(
            err,
            RuleError::RegexCompile { ref pattern, .. } if pattern == "(unclosed"
        ));
    }

    #[test]
    fn test_expand_escapes_and_multi_digit_groups() {
        let re = Regex::new("(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)").unwrap();
        let caps = re.captures("abcdefghijk").unwrap();
        assert_eq!(expand("$11", &caps), "k");
        assert_eq!(expand("$1x", &caps), "ax");
        assert_eq!(expand("\\$1", &caps), "$1");
        assert_eq!(expand("$0", &caps), "abcdefghijk");
        assert_eq!(expand("cost $", &caps), "cost $");

        let re = Regex::new("(a)").unwrap();
        let caps = re.captures("a").unwrap();
        assert_eq!(expand("$12", &caps), "a2");
    }
}
