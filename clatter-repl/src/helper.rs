use colored::Colorize;
use rustyline::completion::Completer;
use rustyline::completion::Pair;
use rustyline::highlight::Highlighter;
use rustyline::highlight::MatchingBracketHighlighter;
use rustyline::hint::Hinter;
use rustyline::hint::HistoryHinter;
use rustyline::validate::ValidationContext;
use rustyline::validate::ValidationResult;
use rustyline::validate::Validator;
use rustyline::Context;
use rustyline::Result;
use rustyline_derive::Helper;
use std::borrow::Cow;
use std::borrow::Cow::Borrowed;
use std::borrow::Cow::Owned;

pub(crate) const COMMANDS: [&str; 3] = [":help", ":systems", ":tokens"];

const FLAGS: [&str; 8] = [
    "--system",
    "--config",
    "--verbose",
    "--again",
    "--exceptional",
    "--rote",
    "--weakness",
    "--help",
];

#[derive(Helper)]
pub(crate) struct ReplHelper {
    pub(crate) highlighter: MatchingBracketHighlighter,
    pub(crate) hinter: HistoryHinter,
    pub(crate) colored: String,
}

impl ReplHelper {
    fn candidates(line: &str, word: &str) -> Vec<&'static str> {
        let previous = line.split_whitespace().last();
        let words: Vec<&'static str> = if word.starts_with(':') {
            COMMANDS.to_vec()
        } else if word.starts_with('-') {
            FLAGS.to_vec()
        } else if matches!(previous, Some("--system") | Some("-s")) {
            clatter_lib::system::available().collect()
        } else {
            Vec::new()
        };
        words.into_iter().filter(|w| w.starts_with(word)).collect()
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>)> {
        let start = line[..pos].rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let candidates = Self::candidates(&line[..start], &line[start..pos])
            .into_iter()
            .map(|word| Pair {
                display: word.to_owned(),
                replacement: word.to_owned(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<Self::Hint> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.dimmed().to_string())
    }

    fn highlight_char(&self, line: &str, pos: usize) -> bool {
        self.highlighter.highlight_char(line, pos)
    }
}

impl Validator for ReplHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }

    fn validate_while_typing(&self) -> bool {
        false
    }
}
