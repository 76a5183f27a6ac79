//! The `fill` command.
//!
//! An interactive session over a [`PersonForm`]. Each input line is one
//! instruction (`set`, `toggle`, `touch`, `status`, `submit`, `wait`,
//! `help`, `quit`). Email checks resolve in the background and are
//! reported as soon as they arrive, interleaved with further input.

use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use intake_core::{IntakeError, IntakeResult, Settings};
use intake_forms::{
    BoundField, EmailVerifier, Field, FieldStatus, FieldValue, Gender, JsonWriterSink, PersonForm,
    ResolutionOutcome, SubmissionSink, Verdict,
};
use intake_http::HttpEmailVerifier;

use crate::command::IntakeCommand;

const HELP: &str = "\
commands:
  set <field> <value>   set firstName, surname, birthDate (YYYY-MM-DD), gender (a,b) or email
  toggle <gender>       check or uncheck male, female or other
  touch <field>         focus a field without changing it
  status                show every field and whether submit is enabled
  submit                submit the form
  wait                  wait for the pending email check
  help                  show this help
  quit                  leave the session";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Set(Field, String),
    Toggle(Gender),
    Touch(Field),
    Status,
    Submit,
    Wait,
    Help,
    Quit,
}

impl FromStr for Instruction {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            "set" => {
                let rest = rest.trim_start();
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let field = field.parse::<Field>().map_err(|e| e.to_string())?;
                Ok(Self::Set(field, value.to_string()))
            }
            "toggle" => rest
                .trim()
                .parse::<Gender>()
                .map(Self::Toggle)
                .map_err(|e| e.to_string()),
            "touch" => rest
                .trim()
                .parse::<Field>()
                .map(Self::Touch)
                .map_err(|e| e.to_string()),
            "status" => Ok(Self::Status),
            "submit" => Ok(Self::Submit),
            "wait" => Ok(Self::Wait),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}', type 'help'")),
        }
    }
}

/// A fill session: a form, where submissions go, and where output goes.
pub struct FillSession<V, S, W> {
    form: PersonForm<V>,
    sink: S,
    out: W,
}

impl<V, S, W> FillSession<V, S, W>
where
    V: EmailVerifier,
    S: SubmissionSink,
    W: Write + Send,
{
    pub const fn new(form: PersonForm<V>, sink: S, out: W) -> Self {
        Self { form, sink, out }
    }

    pub const fn form(&self) -> &PersonForm<V> {
        &self.form
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the output writer, ending the session.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads instructions until `quit` or end of input, reporting email
    /// checks as they resolve. Pending checks are awaited before returning
    /// at end of input.
    ///
    /// # Errors
    ///
    /// Only I/O errors on input or output end the session; bad instructions
    /// and failed submissions are reported and the session continues.
    pub async fn run<R>(&mut self, input: R) -> IntakeResult<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if !self.execute_line(&line).await? {
                        return Ok(());
                    }
                }
                Some(outcome) = self.form.next_resolution(), if self.form.is_validating_email() => {
                    self.report_resolution(&outcome)?;
                }
            }
        }

        while let Some(outcome) = self.form.next_resolution().await {
            self.report_resolution(&outcome)?;
        }
        Ok(())
    }

    /// Executes one line. Returns `false` when the session should end.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing output fails.
    pub async fn execute_line(&mut self, line: &str) -> IntakeResult<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }
        match line.parse::<Instruction>() {
            Ok(instruction) => self.execute(instruction).await,
            Err(message) => {
                writeln!(self.out, "error: {message}")?;
                Ok(true)
            }
        }
    }

    /// Executes one instruction. Returns `false` for [`Instruction::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error only if writing output fails.
    pub async fn execute(&mut self, instruction: Instruction) -> IntakeResult<bool> {
        match instruction {
            Instruction::Set(field, raw) => match FieldValue::parse(field, &raw) {
                Ok(value) => {
                    self.form.touch(field);
                    self.form.set(value);
                    self.write_field(field)?;
                }
                Err(message) => writeln!(self.out, "error: {message}")?,
            },
            Instruction::Toggle(gender) => {
                self.form.touch(Field::Gender);
                self.form.toggle_gender(gender);
                self.write_field(Field::Gender)?;
            }
            Instruction::Touch(field) => {
                self.form.touch(field);
                self.write_field(field)?;
            }
            Instruction::Status => self.write_status()?,
            Instruction::Submit => self.submit().await?,
            Instruction::Wait => {
                while let Some(outcome) = self.form.next_resolution().await {
                    self.report_resolution(&outcome)?;
                }
            }
            Instruction::Help => writeln!(self.out, "{HELP}")?,
            Instruction::Quit => return Ok(false),
        }
        self.out.flush()?;
        Ok(true)
    }

    async fn submit(&mut self) -> IntakeResult<()> {
        match self.form.submit(&self.sink).await {
            Ok(()) => writeln!(self.out, "submitted")?,
            Err(IntakeError::SubmitDisabled) => {
                let reasons: Vec<String> =
                    self.form.blockers().iter().map(ToString::to_string).collect();
                writeln!(self.out, "cannot submit: {}", reasons.join("; "))?;
            }
            Err(err) => writeln!(self.out, "submission failed: {err}")?,
        }
        Ok(())
    }

    fn report_resolution(&mut self, outcome: &ResolutionOutcome) -> IntakeResult<()> {
        match outcome {
            ResolutionOutcome::Applied(Verdict::Valid) => {
                writeln!(self.out, "{}: valid", Field::Email.label())?;
            }
            ResolutionOutcome::Applied(Verdict::Invalid(_)) => {
                let message = self
                    .form
                    .error(Field::Email)
                    .map(|err| err.to_string())
                    .unwrap_or_default();
                writeln!(self.out, "{}: {message}", Field::Email.label())?;
            }
            ResolutionOutcome::Stale => {}
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_field(&mut self, field: Field) -> IntakeResult<()> {
        let line = describe(&self.form.bound_field(field));
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn write_status(&mut self) -> IntakeResult<()> {
        for bound in self.form.bound_fields() {
            writeln!(self.out, "{}", describe(&bound))?;
        }
        let blockers = self.form.blockers();
        if blockers.is_empty() {
            writeln!(self.out, "submit: enabled")?;
        } else {
            let reasons: Vec<String> = blockers.iter().map(ToString::to_string).collect();
            writeln!(self.out, "submit: disabled ({})", reasons.join("; "))?;
        }
        Ok(())
    }
}

/// Renders one field as a status line.
fn describe(bound: &BoundField) -> String {
    let mut line = format!("{}: ", bound.label());
    if bound.value.is_empty() {
        line.push_str("<empty>");
    } else {
        let _ = write!(line, "{:?}", bound.value);
    }
    if bound.loading {
        line.push_str(" [checking]");
    } else if let Some(err) = bound.visible_error() {
        let _ = write!(line, " [{err}]");
    } else if bound.status() == FieldStatus::Success {
        line.push_str(" [ok]");
    }
    line
}

/// Fills a person form interactively from standard input.
pub struct FillCommand;

#[async_trait]
impl IntakeCommand for FillCommand {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn help(&self) -> &'static str {
        "Fill in a person form line by line from standard input"
    }

    async fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), IntakeError> {
        let verifier = HttpEmailVerifier::from_settings(&settings.email_validation)?;
        let form = PersonForm::from_settings(verifier, settings);
        tracing::info!(form_id = %form.id(), "Starting fill session");

        let sink = JsonWriterSink::new(std::io::stdout());
        let mut session = FillSession::new(form, sink, std::io::stdout());
        session.execute(Instruction::Help).await?;
        session
            .run(tokio::io::BufReader::new(tokio::io::stdin()))
            .await
    }
}
