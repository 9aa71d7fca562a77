use std::io::{IsTerminal, Stdout, Write};
use kbagent_lib::ModelProvider;
use crate::catalog::Catalog;
use crate::style::Styles;

const USAGE: &str = "Usage examples:
  By name: -k \"Blossom Analysis,MAPS\"
  By ID: -k \"8be6dfd9-ecaf-4e2b-8414-01aecb67e147\"
  All: -k \"all\"";

/// Terminal output.
pub struct Term<W: Write> {
    styles: Styles,
    dumb: bool,
    out: W,
}

impl Term<Stdout> {
    /// Write to stdout, without styling when it is not a color terminal.
    pub fn new() -> Self {
        let out = std::io::stdout();
        let dumb = Ok("dumb") == std::env::var("TERM").as_deref()
            || std::env::var_os("NO_COLOR").is_some()
            || !out.is_terminal();

        Term::with_writer(out, dumb)
    }
}

impl<W: Write> Term<W> {

    /// Write to `out`.
    pub fn with_writer(out: W, dumb: bool) -> Self {
        Term {
            styles: Styles::new(),
            dumb,
            out,
        }
    }

    fn styled(&self, style: &anstyle::Style, s: &str) -> String {
        if self.dumb {
            s.to_owned()
        } else {
            format!("{style}{s}{style:#}")
        }
    }

    /// Print the knowledge base catalog.
    pub fn print_catalog(&mut self, catalog: &Catalog) -> std::io::Result<()> {
        writeln!(self.out, "{}", self.styled(&self.styles.header, "Available Knowledge Bases:"))?;
        writeln!(self.out, "{}", "-".repeat(50))?;
        for (i, kb) in catalog.entries().iter().enumerate() {
            writeln!(self.out, "{}. {}", i + 1, self.styled(&self.styles.name, &kb.name))?;
            writeln!(self.out, "   ID: {}", self.styled(&self.styles.detail, &kb.id))?;
            writeln!(self.out, "   URL: {}", self.styled(&self.styles.detail, &kb.org_url))?;
            writeln!(self.out)?;
        }
        writeln!(self.out, "{USAGE}")
    }

    /// Print provider, loaded knowledge bases, and memory thread.
    pub fn print_session(&mut self, provider: ModelProvider, catalog: &Catalog, ids: &[String], thread_id: Option<&str>) -> std::io::Result<()> {
        writeln!(self.out, "Using model provider: {}", self.styled(&self.styles.name, provider.as_str()))?;
        writeln!(self.out, "Knowledge bases loaded:")?;
        for id in ids {
            if let Some(kb) = catalog.by_id(id) {
                writeln!(self.out, "  - {} ({})", self.styled(&self.styles.name, &kb.name), id)?;
            }
        }
        if let Some(thread_id) = thread_id {
            writeln!(self.out, "Using conversation memory with thread: {thread_id}")?;
        }
        Ok(())
    }

    /// Print the whole answer.
    pub fn print_answer(&mut self, answer: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", self.styled(&self.styles.answer, answer))
    }

    /// Print a streamed fragment as soon as it arrives.
    pub fn print_token(&mut self, token: &str) -> std::io::Result<()> {
        if self.dumb {
            write!(self.out, "{token}")?;
        } else {
            write!(self.out, "{}{token}{:#}", self.styles.answer, self.styles.answer)?;
        }
        self.out.flush()
    }

    /// Finish streamed output.
    pub fn end_stream(&mut self) -> std::io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
