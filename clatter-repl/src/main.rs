mod cli;
mod helper;
use cli::Parser;
use helper::ReplHelper;

use clatter_lib::command::split_fields;
use clatter_lib::error::Error;
use clatter_lib::source::random_org::RandomOrg;
use clatter_lib::source::Generator;
use clatter_lib::tokenize;
use clatter_lib::RollCommand;
use clatter_lib::RollSystem;
use clatter_lib::Source;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::highlight::MatchingBracketHighlighter;
use rustyline::hint::HistoryHinter;
use rustyline::CompletionType;
use rustyline::Config;
use rustyline::EditMode;
use rustyline::Editor;
use termimad::crossterm::style::Color;
use termimad::MadSkin;
use tracing::debug;
use tracing::info;
use tracing::Level;
use tracing_unwrap::OptionExt;

const HISTORY_FILE: &str = "history";

const HELP: &str = r#"
**clatter** rolls one formula per line, flags first: `--system d20 --verbose 4d6kh3 + 2`

* `--system NAME` one of the systems listed by `:systems`
* `--config JSON` system configuration, `{"again": 9}`
* a JSON object or `'single quoted text'` is read as one field
* `--verbose` `--rote` `--weakness` `--again N` `--exceptional N`
* `:tokens FORMULA` show how a formula is split
* `:systems` list the roll systems
"#;

/// Output of one REPL line
enum Reply {
    Text(String),
    Markdown(&'static str),
}

fn execute(
    line: &str,
    system: &str,
    json: bool,
    source: &mut dyn Source,
) -> clatter_lib::error::Result<Reply> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some(":help") => Ok(Reply::Markdown(HELP)),
        Some(":systems") => Ok(Reply::Text(
            clatter_lib::system::available()
                .collect::<Vec<_>>()
                .join(", "),
        )),
        Some(":tokens") => {
            let formula = words.collect::<Vec<_>>().join(" ");
            let tokens = tokenize(&formula)?;
            Ok(Reply::Text(
                tokens
                    .iter()
                    .map(|t| format!("`{}` {:?}", t, t))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        }
        Some(command) if command.starts_with(':') => Err(Error::InvalidOption(format!(
            "unknown command `{}`, try `:help`",
            command
        ))),
        _ => {
            let fields = ["--system".to_owned(), system.to_owned()]
                .into_iter()
                .chain(split_fields(line)?);
            let roller = RollCommand::from_fields(fields)?.roll(source)?;
            info!("Rolled `{}` with `{}`", line, roller.name());
            if json {
                Ok(Reply::Text(serde_json::to_string_pretty(&roller.to_json()?)?))
            } else {
                Ok(Reply::Text(roller.to_string()))
            }
        }
    }
}

fn main() -> rustyline::Result<()> {
    let dotenv = dotenv::dotenv();
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true)
        .with_max_level(if args.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    if dotenv.is_err() {
        debug!("No `.env` file");
    }

    let mut source: Box<dyn Source> = match (&args.random_org_key, args.seed) {
        (Some(key), _) => {
            info!("Rolling with random.org");
            Box::new(RandomOrg::new(key.as_str()))
        }
        (None, Some(seed)) => {
            info!("Rolling with seed `{}`", seed);
            Box::new(Generator::seeded(seed))
        }
        (None, None) => Box::new(Generator::thread()),
    };

    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();
    let helper = ReplHelper {
        highlighter: MatchingBracketHighlighter::new(),
        hinter: HistoryHinter {},
        colored: "".to_owned(),
    };
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Magenta);
    let mut rline = Editor::with_config(config)?;
    rline.set_helper(Some(helper));
    if rline.load_history(HISTORY_FILE).is_err() {
        eprintln!("{}", "repl: warn: no previous history".bold().yellow());
    }
    let mut count = 1u64;
    loop {
        let prompt = format!("{} {}> ", args.system, count);
        rline.helper_mut().expect_or_log("repl: panic: no helper").colored =
            prompt.bold().green().to_string();
        let readline = rline.readline(&prompt);
        match readline {
            Ok(line) => {
                rline.add_history_entry(line.as_str())?;
                if !line.trim().is_empty() {
                    match execute(line.trim(), &args.system, args.json, source.as_mut()) {
                        Ok(Reply::Text(text)) => println!("{}", skin.inline(&text.magenta().to_string())),
                        Ok(Reply::Markdown(text)) => skin.print_text(text),
                        Err(error) => eprintln!("{}", error.to_string().bold().red()),
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("{}", "repl: signal: CTRL-C".bold().yellow());
                break;
            }
            Err(ReadlineError::Eof) => {
                eprintln!("{}", "repl: signal: CTRL-D".bold().yellow());
                break;
            }
            Err(error) => {
                eprintln!("{}", format!("repl: error: `{:?}`", error).bold().red());
                break;
            }
        }
        count += 1;
    }
    rline.append_history(HISTORY_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clatter_lib::source::Sequence;

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            Reply::Markdown(text) => text.to_owned(),
        }
    }

    #[test]
    fn rolls_with_default_system() {
        let reply = execute("4dF", "fate", false, &mut Sequence::new([5, 5, 3, 3])).unwrap();
        assert_eq!("rolled 4dF: +2 (Fair)", text(reply));
    }

    #[test]
    fn line_picks_its_system() {
        let reply = execute("-s d20 1d20 + 1", "fate", false, &mut Sequence::new([7])).unwrap();
        assert_eq!("rolled 1d20 + 1: 8", text(reply));
    }

    #[test]
    fn config_json_with_spaces() {
        let reply = execute(
            r#"--config {"again": 9, "verbose": true} 1"#,
            "cofd",
            false,
            &mut Sequence::new([9, 2]),
        )
        .unwrap();
        assert_eq!(
            "rolled 1 CofD dice (with 9-again) for 1 successes. rolls: [9] rerolls: [2]",
            text(reply)
        );
    }

    #[test]
    fn json_output() {
        let reply = execute("3", "cofd", true, &mut Sequence::new([8, 8, 2])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text(reply)).unwrap();
        assert_eq!(2, value["results"]["successes"]);
    }

    #[test]
    fn lists_systems() {
        let reply = execute(":systems", "cofd", false, &mut Sequence::new([])).unwrap();
        assert_eq!("cofd, d20, fate", text(reply));
    }

    #[test]
    fn shows_tokens() {
        let reply = execute(":tokens 1d20 + 2", "cofd", false, &mut Sequence::new([])).unwrap();
        assert_eq!(3, text(reply).lines().count());
    }

    #[test]
    fn unknown_command() {
        assert!(execute(":quit", "cofd", false, &mut Sequence::new([])).is_err());
    }
}
