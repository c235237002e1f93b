use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Render,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Render(RenderArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementArg {
    Select,
    Insert,
    Update,
    Delete,
    Keys,
    Columns,
}

impl StatementArg {
    fn parse(v: &str) -> anyhow::Result<Self> {
        Ok(match v {
            "select" => Self::Select,
            "insert" => Self::Insert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "keys" => Self::Keys,
            "columns" => Self::Columns,
            other => anyhow::bail!(
                "unknown statement: {other} (expected select, insert, update, delete, keys or columns)"
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub definition: PathBuf,
    pub statement: StatementArg,
    /// `column=value` pairs for INSERT / UPDATE, in command line order.
    pub set: Vec<(String, String)>,
    pub json: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "render" => parse_render(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut definition: Option<PathBuf> = None;
    let mut statement = StatementArg::Select;
    let mut set: Vec<(String, String)> = Vec::new();
    let mut json = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Render)),
            "--statement" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--statement requires a value");
                };
                statement = StatementArg::parse(v)?;
            }
            _ if token.starts_with("--statement=") => {
                statement = StatementArg::parse(token.trim_start_matches("--statement="))?;
            }
            "--set" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--set requires a value");
                };
                set.push(split_assignment(v)?);
            }
            _ if token.starts_with("--set=") => {
                set.push(split_assignment(token.trim_start_matches("--set="))?);
            }
            "--json" => json = true,
            _ if token.starts_with('-') => anyhow::bail!("unknown argument: {token}"),
            other => {
                if definition.is_some() {
                    anyhow::bail!("unexpected argument: {other}");
                }
                definition = Some(PathBuf::from(other));
            }
        }
    }

    let Some(definition) = definition else {
        anyhow::bail!("render requires a definition file (.toml or .json)");
    };

    match statement {
        StatementArg::Insert | StatementArg::Update if set.is_empty() => {
            anyhow::bail!("INSERT and UPDATE require at least one --set column=value");
        }
        StatementArg::Insert | StatementArg::Update => {}
        _ if !set.is_empty() => {
            anyhow::bail!("--set is only valid with --statement insert or update");
        }
        _ => {}
    }

    Ok(Command::Render(RenderArgs {
        definition,
        statement,
        set,
        json,
    }))
}

fn split_assignment(v: &str) -> anyhow::Result<(String, String)> {
    let Some((column, value)) = v.split_once('=') else {
        anyhow::bail!("--set expects column=value, got: {v}");
    };
    let column = column.trim();
    if column.is_empty() {
        anyhow::bail!("--set column must not be empty: {v}");
    }
    Ok((column.to_string(), value.to_string()))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
dynsql - render SQL statements from data source definitions

USAGE:
  dynsql <COMMAND> [OPTIONS]

COMMANDS:
  render        Print the SQL and parameters built from a definition
  help          Print this message

Run `dynsql <command> --help` for more."
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  dynsql render <DEFINITION> [OPTIONS]

ARGS:
  <DEFINITION>              Data source definition (.toml or .json)

OPTIONS:
  --statement <KIND>        select (default), insert, update, delete, keys, columns
  --set <COLUMN=VALUE>      Column value for insert/update (repeatable); JSON
                            literals are typed, anything else is text
  --json                    Print the statement as one JSON object
  -h, --help                Print help"
            );
        }
    }
}
