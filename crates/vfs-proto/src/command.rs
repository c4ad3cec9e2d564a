//! Command-line grammar
//!
//! A command line is a case-insensitive keyword followed by
//! whitespace-separated arguments. Double quotes group an argument that
//! contains spaces.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Command-line parsing error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("unterminated quote in command line")]
    UnterminatedQuote,
}

/// A parsed console command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    MakeDirectory { path: String },
    ChangeDirectory { path: String },
    RemoveDirectory { path: String },
    DeleteTree { path: String },
    MakeFile { path: String },
    DeleteFile { path: String },
    LockFile { path: String },
    UnlockFile { path: String },
    Copy { source: String, dest: String },
    Move { source: String, dest: String },
    PrintTree,
}

fn split_arguments(line: &str) -> Result<Vec<String>, ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

fn take_args<const N: usize>(command: &'static str, args: Vec<String>) -> Result<[String; N], ParseError> {
    let found = args.len();
    args.try_into().map_err(|_| ParseError::ArgumentCount {
        command,
        expected: N,
        found,
    })
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut args = split_arguments(line)?;
        if args.is_empty() {
            return Err(ParseError::Empty);
        }
        let keyword = args.remove(0).to_ascii_lowercase();

        let command = match keyword.as_str() {
            "md" => {
                let [path] = take_args::<1>("md", args)?;
                Command::MakeDirectory { path }
            }
            "cd" => {
                let [path] = take_args::<1>("cd", args)?;
                Command::ChangeDirectory { path }
            }
            "rd" => {
                let [path] = take_args::<1>("rd", args)?;
                Command::RemoveDirectory { path }
            }
            "deltree" => {
                let [path] = take_args::<1>("deltree", args)?;
                Command::DeleteTree { path }
            }
            "mf" => {
                let [path] = take_args::<1>("mf", args)?;
                Command::MakeFile { path }
            }
            "del" => {
                let [path] = take_args::<1>("del", args)?;
                Command::DeleteFile { path }
            }
            "lock" => {
                let [path] = take_args::<1>("lock", args)?;
                Command::LockFile { path }
            }
            "unlock" => {
                let [path] = take_args::<1>("unlock", args)?;
                Command::UnlockFile { path }
            }
            "copy" => {
                let [source, dest] = take_args::<2>("copy", args)?;
                Command::Copy { source, dest }
            }
            "move" => {
                let [source, dest] = take_args::<2>("move", args)?;
                Command::Move { source, dest }
            }
            "print" => {
                let [] = take_args::<0>("print", args)?;
                Command::PrintTree
            }
            _ => return Err(ParseError::UnknownCommand(keyword)),
        };
        Ok(command)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Command::MakeDirectory { .. } => "md",
            Command::ChangeDirectory { .. } => "cd",
            Command::RemoveDirectory { .. } => "rd",
            Command::DeleteTree { .. } => "deltree",
            Command::MakeFile { .. } => "mf",
            Command::DeleteFile { .. } => "del",
            Command::LockFile { .. } => "lock",
            Command::UnlockFile { .. } => "unlock",
            Command::Copy { .. } => "copy",
            Command::Move { .. } => "move",
            Command::PrintTree => "print",
        }
    }

    /// Whether the command changes the tree (and is announced to other sessions)
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::ChangeDirectory { .. } | Command::PrintTree)
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn quoted(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::MakeDirectory { path }
            | Command::ChangeDirectory { path }
            | Command::RemoveDirectory { path }
            | Command::DeleteTree { path }
            | Command::MakeFile { path }
            | Command::DeleteFile { path }
            | Command::LockFile { path }
            | Command::UnlockFile { path } => write!(f, "{} {}", self.keyword(), quoted(path)),
            Command::Copy { source, dest } | Command::Move { source, dest } => {
                write!(f, "{} {} {}", self.keyword(), quoted(source), quoted(dest))
            }
            Command::PrintTree => f.write_str(self.keyword()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_arguments_with_quotes() {
        assert_eq!(
            split_arguments(r#"  copy "C:/my docs"   D:/  "#).unwrap(),
            vec!["copy", "C:/my docs", "D:/"]
        );
        assert_eq!(split_arguments(r#"md """#).unwrap(), vec!["md", ""]);
        assert_eq!(split_arguments("md \"open").unwrap_err(), ParseError::UnterminatedQuote);
    }

    #[test]
    fn test_display_quotes_spaces() {
        let command = Command::Copy {
            source: "C:/my docs".to_string(),
            dest: "D:".to_string(),
        };
        assert_eq!(command.to_string(), r#"copy "C:/my docs" D:"#);
    }
}
