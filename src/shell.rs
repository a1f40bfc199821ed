//! Line-oriented interactive session over one dataset.
//!
//! Each input line is one command. Transform commands commit a new state to
//! the session history; navigation commands only move the page cursor.
//! Command errors are reported inline and the session continues.

use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow, bail, ensure};
use log::{debug, info};

use crate::{
    chart,
    filter::{FilterCondition, parse_filter},
    history::{Session, TransformHistory},
    pipeline::TransformState,
    sort::{SortConfig, SortDirection},
    table,
};

const PROMPT: &str = "> ";

const HELP: &str = "\
Commands:
  show                     display the current page
  sort <col> [asc|desc]    sort by a column (ascending by default)
  sort none                clear the sort
  toggle <col>             cycle a column through asc, desc and unsorted
  filter <expr>            add a filter, e.g. `age > 30` or `name contains ann`
  unfilter <n>             remove the n-th filter (see `state`)
  group <col>|none         set or clear the group column
  groups                   summarize the current groups
  chart <x> [y]            average y per x as a bar chart
  undo | redo | reset      step through or clear transform history
  next | prev | first | last | page <n>
  pagesize <n>             rows per page
  state                    show the active transforms
  help                     show this message
  quit                     leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Show,
    Sort(Option<SortConfig>),
    Toggle(String),
    Filter(FilterCondition),
    Unfilter(usize),
    Group(Option<String>),
    Groups,
    Chart { x: String, y: Option<String> },
    Undo,
    Redo,
    Reset,
    Next,
    Previous,
    First,
    Last,
    Page(usize),
    PageSize(usize),
    State,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));
        let command = match name.to_ascii_lowercase().as_str() {
            "show" | "ls" => ShellCommand::Show,
            "sort" => ShellCommand::Sort(parse_sort_args(rest)?),
            "toggle" => ShellCommand::Toggle(required(rest, "toggle <column>")?),
            "filter" => ShellCommand::Filter(parse_filter(rest)?),
            "unfilter" => ShellCommand::Unfilter(parse_number(rest, "unfilter <n>")?),
            "group" => ShellCommand::Group(match required(rest, "group <column>|none")? {
                column if column.eq_ignore_ascii_case("none") => None,
                column => Some(column),
            }),
            "groups" => ShellCommand::Groups,
            "chart" => {
                let mut parts = rest.split_whitespace();
                let x = parts
                    .next()
                    .ok_or_else(|| anyhow!("Usage: chart <x> [y]"))?
                    .to_string();
                ShellCommand::Chart {
                    x,
                    y: parts.next().map(str::to_string),
                }
            }
            "undo" => ShellCommand::Undo,
            "redo" => ShellCommand::Redo,
            "reset" => ShellCommand::Reset,
            "next" | "n" => ShellCommand::Next,
            "prev" | "previous" | "p" => ShellCommand::Previous,
            "first" => ShellCommand::First,
            "last" => ShellCommand::Last,
            "page" => ShellCommand::Page(parse_number(rest, "page <n>")?),
            "pagesize" => ShellCommand::PageSize(parse_number(rest, "pagesize <n>")?),
            "state" => ShellCommand::State,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => bail!("Unknown command '{other}'. Type `help` for a list of commands."),
        };
        Ok(command)
    }
}

fn required(rest: &str, usage: &str) -> Result<String> {
    ensure!(!rest.is_empty(), "Usage: {usage}");
    Ok(rest.to_string())
}

fn parse_number(rest: &str, usage: &str) -> Result<usize> {
    rest.parse::<usize>()
        .with_context(|| format!("Usage: {usage}"))
}

fn parse_sort_args(rest: &str) -> Result<Option<SortConfig>> {
    ensure!(!rest.is_empty(), "Usage: sort <column> [asc|desc] | sort none");
    if rest.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let (column, direction) = match rest.rsplit_once(char::is_whitespace) {
        Some((column, direction)) => match direction.parse::<SortDirection>() {
            Ok(direction) => (column.trim(), direction),
            Err(_) => (rest, SortDirection::Asc),
        },
        None => (rest, SortDirection::Asc),
    };
    Ok(Some(SortConfig::new(column, direction)))
}

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    session: Session,
    page_size_options: Vec<usize>,
    chart_group_limit: usize,
}

impl Shell {
    pub fn new(
        session: Session,
        page_size_options: Vec<usize>,
        chart_group_limit: usize,
    ) -> Self {
        Self {
            session,
            page_size_options,
            chart_group_limit,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reads commands from `input` until EOF or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        let dataset = self.session.dataset();
        writeln!(
            output,
            "{}: {} rows, {} columns. Type `help` for commands.",
            dataset.name,
            dataset.row_count(),
            dataset.columns.len()
        )?;

        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let outcome = line
                .parse::<ShellCommand>()
                .and_then(|command| self.execute(command, &mut output));
            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => writeln!(output, "error: {err:#}")?,
            }
        }
        output.flush()?;
        info!(
            "Shell closed after {} recorded state(s)",
            self.session.history().states().len()
        );
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: ShellCommand, output: &mut W) -> Result<Flow> {
        debug!("Shell command {command:?}");
        match command {
            ShellCommand::Show => self.show(output)?,
            ShellCommand::Sort(sort) => {
                if let Some(config) = &sort {
                    self.ensure_column(&config.column)?;
                }
                let next = self.session.current().with_sort(sort);
                self.commit(next, output)?;
            }
            ShellCommand::Toggle(column) => {
                self.ensure_column(&column)?;
                let next = self.session.current().with_column_sort_toggled(&column);
                self.commit(next, output)?;
            }
            ShellCommand::Filter(condition) => {
                self.ensure_column(&condition.column)?;
                let next = self.session.current().with_filter_added(condition);
                self.commit(next, output)?;
            }
            ShellCommand::Unfilter(position) => {
                let count = self.session.current().filters.len();
                ensure!(
                    (1..=count).contains(&position),
                    "No filter #{position}; {count} filter(s) active"
                );
                let next = self.session.current().with_filter_removed(position - 1);
                self.commit(next, output)?;
            }
            ShellCommand::Group(group_by) => {
                if let Some(column) = &group_by {
                    self.ensure_column(column)?;
                }
                let next = self.session.current().with_group_by(group_by);
                self.commit(next, output)?;
            }
            ShellCommand::Groups => {
                write!(output, "{}", table::render_groups(&self.session.groups()))?;
            }
            ShellCommand::Chart { x, y } => self.chart(&x, y.as_deref(), output)?,
            ShellCommand::Undo => {
                if !self.session.undo() {
                    writeln!(output, "Nothing to undo")?;
                }
                self.report_state(output)?;
            }
            ShellCommand::Redo => {
                if !self.session.redo() {
                    writeln!(output, "Nothing to redo")?;
                }
                self.report_state(output)?;
            }
            ShellCommand::Reset => {
                self.session.reset();
                self.report_state(output)?;
            }
            ShellCommand::Next => {
                let total = self.total_pages();
                self.session.page_cursor_mut().next(total);
                self.show(output)?;
            }
            ShellCommand::Previous => {
                self.session.page_cursor_mut().previous();
                self.show(output)?;
            }
            ShellCommand::First => {
                self.session.page_cursor_mut().first();
                self.show(output)?;
            }
            ShellCommand::Last => {
                let total = self.total_pages();
                self.session.page_cursor_mut().last(total);
                self.show(output)?;
            }
            ShellCommand::Page(page) => {
                let total = self.total_pages();
                self.session.page_cursor_mut().go_to(page, total);
                self.show(output)?;
            }
            ShellCommand::PageSize(size) => {
                ensure!(size > 0, "Page size must be greater than zero");
                ensure!(
                    self.page_size_options.is_empty() || self.page_size_options.contains(&size),
                    "Page size must be one of {:?}",
                    self.page_size_options
                );
                self.session.page_cursor_mut().set_page_size(size);
                self.show(output)?;
            }
            ShellCommand::State => self.report_state(output)?,
            ShellCommand::Help => write!(output, "{HELP}")?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn commit<W: Write>(&mut self, next: TransformState, output: &mut W) -> Result<()> {
        self.session.commit(next);
        self.report_state(output)
    }

    fn ensure_column(&self, column: &str) -> Result<()> {
        let columns = &self.session.dataset().columns;
        ensure!(
            columns.iter().any(|c| c == column),
            "Unknown column '{column}'. Available: {}",
            columns.join(", ")
        );
        Ok(())
    }

    fn total_pages(&self) -> usize {
        self.session
            .rows()
            .len()
            .div_ceil(self.session.page_cursor().page_size())
    }

    fn show<W: Write>(&self, output: &mut W) -> Result<()> {
        let dataset = self.session.dataset();
        let filtered_from =
            (!self.session.current().filters.is_empty()).then_some(dataset.row_count());
        let rendered = self
            .session
            .with_page(|page| table::render_page(&dataset.columns, &page, filtered_from));
        write!(output, "{rendered}")?;
        Ok(())
    }

    fn chart<W: Write>(&self, x: &str, y: Option<&str>, output: &mut W) -> Result<()> {
        self.ensure_column(x)?;
        let dataset = self.session.dataset();
        let y = match y {
            Some(y) => {
                self.ensure_column(y)?;
                y
            }
            None => chart::numeric_columns(&dataset.columns, &dataset.rows)
                .into_iter()
                .find(|column| *column != x)
                .ok_or_else(|| anyhow!("No numeric column to chart against '{x}'"))?,
        };
        let points = chart::aggregate(self.session.rows(), x, y, self.chart_group_limit);
        writeln!(output, "avg({y}) by {x}")?;
        write!(output, "{}", table::render_chart(&points))?;
        Ok(())
    }

    fn report_state<W: Write>(&self, output: &mut W) -> Result<()> {
        let state = self.session.current();
        writeln!(output, "{state}")?;
        for (index, filter) in state.filters.iter().enumerate() {
            writeln!(output, "  #{} {filter}", index + 1)?;
        }
        let history = self.session.history();
        writeln!(
            output,
            "{} matching rows | history {}/{}{}{}",
            self.session.rows().len(),
            history.history_index() + 1,
            history.states().len() - 1,
            if self.session.can_undo() { " | undo" } else { "" },
            if self.session.can_redo() { " | redo" } else { "" },
        )?;
        Ok(())
    }
}
