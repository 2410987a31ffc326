#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradebook
//! ## Introduction
//!
//! Records grades and predicts course grades from a grading policy.
//!
//! Paths default to `gradebook.json` and `policy.json`; set
//! `GRADEBOOK_BOOK`, `GRADEBOOK_POLICY`, `GRADEBOOK_COURSE` and
//! `GRADEBOOK_LOG` (in the environment or a `.env` file) to change them.

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use gradebook::{
    GradeBook, GradeScheme, GradingPolicy, Policy, config, export, instant, report,
    types::GradeValue,
};
use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt, prelude::*};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Show the breakdown and prediction for one user
    Predict {
        /// Gradebook file
        book:     Option<PathBuf>,
        /// Policy file
        policy:   Option<PathBuf>,
        /// Evaluation instant
        at:       Option<String>,
        /// Print JSON instead of a table
        json:     bool,
        /// User to evaluate
        username: String,
    },
    /// Check a policy against a gradebook
    Validate {
        /// Gradebook file
        book:   Option<PathBuf>,
        /// Policy file
        policy: Option<PathBuf>,
    },
    /// Write the D2L CSV export
    Export {
        /// Gradebook file
        book:   Option<PathBuf>,
        /// Policy file
        policy: Option<PathBuf>,
        /// Roster file
        roster: Option<PathBuf>,
        /// Output file, stdout when absent
        out:    Option<PathBuf>,
        /// Evaluation instant
        at:     Option<String>,
    },
    /// Convert a value through a grade scheme
    Convert {
        /// Scheme as JSON
        scheme: String,
        /// Value to convert
        value:  String,
    },
    /// Record a grade
    Record {
        /// Gradebook file
        book:       Option<PathBuf>,
        /// Assignment id
        assignment: String,
        /// User
        username:   String,
        /// Value as typed
        value:      String,
    },
    /// Excuse a user from an assignment
    Excuse {
        /// Gradebook file
        book:       Option<PathBuf>,
        /// Assignment id
        assignment: String,
        /// User
        username:   String,
    },
    /// Remove every grade of a user
    RemoveUser {
        /// Gradebook file
        book:     Option<PathBuf>,
        /// User
        username: String,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the gradebook path
    fn book() -> impl Parser<Option<PathBuf>> {
        long("book")
            .short('b')
            .help("Path to the gradebook JSON file")
            .argument::<PathBuf>("PATH")
            .optional()
    }

    /// parses the policy path
    fn policy() -> impl Parser<Option<PathBuf>> {
        long("policy")
            .short('p')
            .help("Path to the grading policy JSON file")
            .argument::<PathBuf>("PATH")
            .optional()
    }

    /// parses the evaluation instant
    fn at() -> impl Parser<Option<String>> {
        long("at")
            .help("Evaluate as of this RFC 3339 timestamp instead of now")
            .argument::<String>("TIME")
            .optional()
    }

    /// parses a username
    fn username() -> impl Parser<String> {
        positional::<String>("USER").help("Username")
    }

    /// parses an assignment id
    fn assignment() -> impl Parser<String> {
        long("assignment")
            .short('a')
            .help("Assignment id")
            .argument::<String>("ID")
    }

    let predict = {
        let book = book();
        let policy = policy();
        let at = at();
        let json = long("json").help("Print the evaluation as JSON").switch();
        let username = username();
        construct!(Cmd::Predict {
            book,
            policy,
            at,
            json,
            username
        })
    }
    .to_options()
    .command("predict")
    .help("Predict a user's course grade");

    let validate = {
        let book = book();
        let policy = policy();
        construct!(Cmd::Validate { book, policy })
    }
    .to_options()
    .command("validate")
    .help("Validate a grading policy against the gradebook");

    let export = {
        let book = book();
        let policy = policy();
        let roster = long("roster")
            .help("JSON list of user profiles for the name columns")
            .argument::<PathBuf>("PATH")
            .optional();
        let out = long("out")
            .short('o')
            .help("Where to write the CSV")
            .argument::<PathBuf>("PATH")
            .optional();
        let at = at();
        construct!(Cmd::Export {
            book,
            policy,
            roster,
            out,
            at
        })
    }
    .to_options()
    .command("export")
    .help("Export grades as D2L-compatible CSV");

    let convert = {
        let scheme = positional::<String>("SCHEME").help("Grade scheme as JSON, e.g. '{\"type\":\"letter\"}'");
        let value = positional::<String>("VALUE").help("Value to convert");
        construct!(Cmd::Convert { scheme, value })
    }
    .to_options()
    .command("convert")
    .help("Show the correctness of a value and convert it back");

    let record = {
        let book = book();
        let assignment = assignment();
        let username = username();
        let value = positional::<String>("VALUE").help("Grade value");
        construct!(Cmd::Record {
            book,
            assignment,
            username,
            value
        })
    }
    .to_options()
    .command("record")
    .help("Record a grade");

    let excuse = {
        let book = book();
        let assignment = assignment();
        let username = username();
        construct!(Cmd::Excuse {
            book,
            assignment,
            username
        })
    }
    .to_options()
    .command("excuse")
    .help("Excuse a user from an assignment");

    let remove_user = {
        let book = book();
        let username = username();
        construct!(Cmd::RemoveUser { book, username })
    }
    .to_options()
    .command("remove-user")
    .help("Remove every grade of a user");

    let cmd = construct!([predict, validate, export, convert, record, excuse, remove_user]);

    cmd.to_options()
        .descr("Gradebook and grade predictions")
        .run()
}

/// Loads the gradebook and policy, falling back to configured paths.
fn load(book: Option<PathBuf>, policy: Option<PathBuf>) -> Result<(GradeBook, Policy)> {
    let book = GradeBook::load(book.unwrap_or_else(config::book_path))?;
    let policy = Policy::load(policy.unwrap_or_else(config::policy_path))?;
    Ok((book, policy))
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr);
    let filter_layer = LevelFilter::from_level(config::log_level());
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Predict {
            book,
            policy,
            at,
            json,
            username,
        } => {
            let (book, policy) = load(book, policy)?;
            let now = instant(at.as_deref())?;
            let evaluation = policy.evaluate(&book, &username, now);
            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                println!("{}", report::render(&evaluation));
            }
        }
        Cmd::Validate { book, policy } => {
            let (book, policy) = load(book, policy)?;
            policy
                .validate(&book)
                .context("Grading policy does not match the gradebook")?;
            println!("{}", "Grading policy is valid".green());
        }
        Cmd::Export {
            book,
            policy,
            roster,
            out,
            at,
        } => {
            let (book, policy) = load(book, policy)?;
            let now = instant(at.as_deref())?;
            let roster = match roster {
                Some(path) => export::load_roster(path)?,
                None => export::Roster::new(),
            };
            match out {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("Could not create {}", path.display()))?;
                    export::write_csv(file, &book, &policy, &roster, now)?;
                }
                None => export::write_csv(io::stdout(), &book, &policy, &roster, now)?,
            }
        }
        Cmd::Convert { scheme, value } => {
            let scheme: GradeScheme =
                serde_json::from_str(&scheme).context("Could not parse grade scheme JSON")?;
            let parsed = scheme.from_text(&value)?;
            let correctness = scheme.to_correctness(&parsed)?;
            let back: GradeValue = scheme.from_correctness(correctness)?;
            println!("{scheme}: {parsed} -> {correctness:.4} -> {back}");
        }
        Cmd::Record {
            book,
            assignment,
            username,
            value,
        } => {
            let path = book.unwrap_or_else(config::book_path);
            let mut book = GradeBook::load(&path)?;
            book.record_grade(&assignment, &username, value, instant(None)?)?;
            book.save(&path)?;
        }
        Cmd::Excuse {
            book,
            assignment,
            username,
        } => {
            let path = book.unwrap_or_else(config::book_path);
            let mut book = GradeBook::load(&path)?;
            book.excuse(&assignment, &username, instant(None)?)?;
            book.save(&path)?;
        }
        Cmd::RemoveUser { book, username } => {
            let path = book.unwrap_or_else(config::book_path);
            let mut book = GradeBook::load(&path)?;
            let removed = book.remove_user(&username);
            if removed > 0 {
                book.save(&path)?;
            }
            println!("Removed {removed} grade(s) for {username}");
        }
    };

    Ok(())
}
