use std::io::{self, Write};

use loan_form::{
    AssessmentSession, Control, FormView, PredictionClient, ResultView, View, render::BUSY_LABEL,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const HELP: &str = "\
  Commands:
    <field> = <value>     edit a field by number or name (e.g. `3 = Master`)
    set <field> <value>   same as above
    submit                send the application for prediction
    reset                 assess another applicant (restores defaults)
    show                  redraw the current screen
    help                  this message
    quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: String, value: String },
    Submit,
    Reset,
    Show,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix("set ") {
            let rest = rest.trim_start();
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            return Some(Command::Set {
                field: field.to_string(),
                value: value.trim().to_string(),
            });
        }

        if let Some((field, value)) = line.split_once('=') {
            return Some(Command::Set {
                field: field.trim().to_string(),
                value: value.trim().to_string(),
            });
        }

        let command = match line.to_ascii_lowercase().as_str() {
            "submit" | "s" | "predict" => Command::Submit,
            "reset" | "another" | "new" => Command::Reset,
            "show" | "form" => Command::Show,
            "help" | "?" | "h" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Resolve `reference` to a field and hand `raw` to its control.
///
/// Returns the key that was written, or `None` when no field matches.
pub fn apply_assignment(
    session: &mut AssessmentSession,
    reference: &str,
    raw: &str,
) -> Option<&'static str> {
    let (key, value) = {
        let field = session.schema().resolve_field(reference)?;
        (field.key, Control::for_field(field).resolve(raw))
    };
    session.update_field(key, value);
    Some(key)
}

/// Line-oriented front end over an [`AssessmentSession`].
pub struct Terminal<'a, W: Write> {
    session: AssessmentSession,
    client: &'a dyn PredictionClient,
    out: W,
}

impl<'a, W: Write> Terminal<'a, W> {
    pub fn new(session: AssessmentSession, client: &'a dyn PredictionClient, out: W) -> Self {
        Self {
            session,
            client,
            out,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    pub fn render(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  Loan Predictor")?;
        writeln!(self.out)?;
        match (self.session.view(), self.session.state().result()) {
            (View::Result, Some(result)) => {
                writeln!(self.out, "{}", ResultView::from_result(result))?
            }
            _ => writeln!(self.out, "{}", FormView::new(&self.session))?,
        }
        self.out.flush()
    }

    pub async fn handle(&mut self, command: Command) -> io::Result<Flow> {
        debug!(?command, "Handling command");

        match command {
            Command::Set { field, value } => {
                if self.session.view() == View::Result {
                    writeln!(self.out, "  Type 'reset' to assess another applicant.")?;
                    return Ok(Flow::Continue);
                }
                match apply_assignment(&mut self.session, &field, &value) {
                    Some(key) => {
                        let current = self
                            .session
                            .form()
                            .get(key)
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        writeln!(self.out, "  {} = {}", key, current)?;
                    }
                    None => writeln!(
                        self.out,
                        "  Unknown field `{}`. Type 'show' to list fields.",
                        field
                    )?,
                }
            }
            Command::Submit => {
                if self.session.view() == View::Result {
                    writeln!(self.out, "  Type 'reset' to assess another applicant.")?;
                    return Ok(Flow::Continue);
                }
                if !self.session.submit_enabled() {
                    return Ok(Flow::Continue);
                }
                writeln!(self.out, "  [{}]", BUSY_LABEL)?;
                self.out.flush()?;
                self.session.submit(self.client).await;
                self.render()?;
            }
            Command::Reset => {
                self.session.reset();
                self.render()?;
            }
            Command::Show => self.render()?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(input) => writeln!(
                self.out,
                "  Unknown command `{}`. Type 'help' for commands.",
                input
            )?,
        }

        Ok(Flow::Continue)
    }

    /// Render, then process commands from `input` until it ends or the user quits.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        self.render()?;
        writeln!(self.out, "{}", HELP)?;

        let mut lines = input.lines();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            if self.handle(command).await? == Flow::Quit {
                break;
            }
        }

        Ok(())
    }
}
