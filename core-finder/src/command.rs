// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The core-finder binary's command-line interface.

use std::{fs, process};

use codespan_reporting::{
    diagnostic::Diagnostic,
    files::SimpleFile,
    term::{
        self as terminal,
        termcolor::{ColorChoice, StandardStream},
    },
};

use ltl::{
    parser::parse_error_diagnostic,
    scope::Scope,
    syntax::{Formula, Sigma},
};
use solver::{
    conf::{OracleConf, DEFAULT_MAX_ELEMENTARY},
    timing, Oracle, SolverError,
};
use unsat_core::{CoreConf, CoreSearch};

use crate::report::Report;

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorOutput {
    Never,
    Auto,
    Always,
}

#[derive(clap::Parser, Debug)]
#[command(about, long_about=None)]
/// Decide an LTL formula and, when it is unsatisfiable, find an
/// unsatisfiable core.
pub struct App {
    #[arg(value_enum, long, default_value_t = ColorOutput::Auto)]
    /// Control color output. Auto disables colors with TERM=dumb or
    /// NO_COLOR=true.
    color: ColorOutput,

    /// File containing the formula
    #[arg(required_unless_present = "formula", conflicts_with = "formula")]
    file: Option<String>,

    #[arg(long)]
    /// The formula itself, instead of a file
    formula: Option<String>,

    #[arg(long)]
    /// Use finite-trace semantics instead of infinite traces
    finite: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_ELEMENTARY)]
    /// Give up on formulas needing more elementary formulas than this
    max_elementary: usize,

    #[arg(long)]
    /// Enumerate subsets of at most this many subformulas of equal weight
    max_group_size: Option<usize>,

    #[arg(long = "declare", value_name = "NAME")]
    /// Declare a proposition; once any is declared, undeclared ones are errors
    declare: Vec<String>,

    #[arg(long)]
    /// Print timing statistics
    time: bool,

    #[arg(long)]
    /// Print the result as JSON
    json: bool,
}

impl App {
    fn oracle_conf(&self) -> OracleConf {
        OracleConf {
            max_elementary: self.max_elementary,
        }
    }

    fn core_conf(&self) -> CoreConf {
        CoreConf {
            max_group_size: self.max_group_size,
        }
    }

    fn scope(&self, sigma: &Sigma) -> Scope {
        let mut scope = Scope::new(sigma);
        for name in &self.declare {
            scope.declare(name);
        }
        scope
    }

    fn input(&self) -> (String, String) {
        match (&self.file, &self.formula) {
            (_, Some(formula)) => ("<formula>".to_string(), formula.clone()),
            (Some(path), None) => match fs::read_to_string(path) {
                Ok(text) => (path.clone(), text),
                Err(err) => {
                    eprintln!("could not read {path}: {err}");
                    process::exit(1);
                }
            },
            (None, None) => unreachable!("clap requires a file or a formula"),
        }
    }

    /// Solve `f` and, if it is unsatisfiable, shrink it to a core.
    fn decide(&self, scope: &Scope, f: &Formula) -> Result<Report, SolverError> {
        let oracle = self.oracle_conf().oracle();
        let res = oracle.solve(scope, f, self.finite)?;
        if let Some(report) = Report::answer(&res) {
            return Ok(report);
        }
        log::info!("{f} is unsatisfiable, searching for a core");
        let core = CoreSearch::new(&oracle, scope, self.finite)
            .with_conf(self.core_conf())
            .run(f)?;
        Ok(Report::unsat(&core))
    }

    /// Run the application.
    pub fn exec(self) {
        let (name, text) = self.input();
        let files = SimpleFile::new(name, &text);

        let writer = StandardStream::stderr(match &self.color {
            ColorOutput::Never => ColorChoice::Never,
            ColorOutput::Always => ColorChoice::Always,
            ColorOutput::Auto => ColorChoice::Auto,
        });
        let config = codespan_reporting::term::Config {
            start_context_lines: 3,
            end_context_lines: 3,
            ..Default::default()
        };

        let sigma = Sigma::new();
        let f = match ltl::parser::parse(&sigma, &text) {
            Ok(f) => f,
            Err(err) => {
                let diagnostic = parse_error_diagnostic((), &err);
                terminal::emit(&mut writer.lock(), &config, &files, &diagnostic).unwrap();
                process::exit(1);
            }
        };
        let scope = self.scope(&sigma);

        let r = self.decide(&scope, &f);
        if self.time {
            eprint!("{}", timing::report());
        }
        match r {
            Ok(report) if self.json => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("could not serialize report: {err}");
                    process::exit(1);
                }
            },
            Ok(report) => print!("{report}"),
            Err(err) => {
                let diagnostic: Diagnostic<()> = Diagnostic::error().with_message(err.to_string());
                terminal::emit(&mut writer.lock(), &config, &files, &diagnostic).unwrap();
                process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_arguments() {
        let app = App::parse_from([
            "core-finder",
            "--formula",
            "a & !a",
            "--finite",
            "--declare",
            "a",
            "--declare",
            "b",
            "--max-group-size",
            "4",
        ]);
        assert_eq!(app.formula.as_deref(), Some("a & !a"));
        assert!(app.finite);
        assert_eq!(app.declare, ["a", "b"]);
        assert_eq!(app.core_conf().max_group_size, Some(4));
        assert_eq!(app.oracle_conf(), OracleConf::default());

        let sigma = Sigma::new();
        let scope = app.scope(&sigma);
        assert!(scope.is_declared(&"b".into()));
        assert!(!scope.is_declared(&"c".into()));
    }

    #[test]
    fn test_file_or_formula() {
        assert!(App::try_parse_from(["core-finder"]).is_err());
        assert!(App::try_parse_from(["core-finder", "x.ltl", "--formula", "a"]).is_err());
        assert!(App::try_parse_from(["core-finder", "x.ltl"]).is_ok());
    }

    #[test]
    fn test_decide() {
        let app = App::parse_from(["core-finder", "--formula", "unused"]);
        let sigma = Sigma::new();
        let scope = app.scope(&sigma);
        let f = ltl::parser::formula(&sigma, "G F p & F G !p");
        match app.decide(&scope, &f).unwrap() {
            Report::Unsat { core, .. } => assert!(core.contains('p')),
            other => panic!("expected a core, got {other}"),
        }
        let f = ltl::parser::formula(&sigma, "G F p");
        assert!(matches!(app.decide(&scope, &f), Ok(Report::Sat { .. })));
    }
}
