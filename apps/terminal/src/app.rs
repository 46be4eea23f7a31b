use std::io::Write;

use anyhow::Result;
use client_core::{ConversationController, IngestionOutcome, Session, SubmitOutcome, View};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::{
    commands::{InputCommand, HELP},
    render::{render_notice, render_turn},
};

pub const ENTRY_PROMPT: &str = "Enter GitHub repo URL: ";
pub const CHAT_PROMPT: &str = "> ";

/// Drives a [`Session`] from line input. Transcript output goes to `out`,
/// user-facing notices to `err`.
pub struct TerminalApp<O, E> {
    session: Session,
    out: O,
    err: E,
}

impl<O: Write, E: Write> TerminalApp<O, E> {
    pub fn new(session: Session, out: O, err: E) -> Self {
        Self { session, out, err }
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Runs until `/quit` or end of input. Requests are awaited inline, so no
    /// new line is read while one is in flight.
    pub async fn run<R>(&mut self, input: R, initial_repo: Option<String>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        if let Some(repo) = initial_repo {
            self.submit_repository(repo).await?;
        }

        let mut lines = input.lines();
        loop {
            self.prompt()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match InputCommand::parse(&line) {
                InputCommand::Quit => break,
                InputCommand::Help => writeln!(self.out, "{HELP}")?,
                InputCommand::Home => self.go_home().await?,
                InputCommand::History => self.print_history().await?,
                InputCommand::Text(text) => match self.session.conversation() {
                    Some(conversation) => self.ask(&conversation, &text).await?,
                    None => self.submit_repository(text).await?,
                },
            }
        }

        self.session.back_home().await;
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        let prompt = match self.session.view() {
            View::Entry => ENTRY_PROMPT,
            View::Conversation(_) => CHAT_PROMPT,
        };
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        Ok(())
    }

    async fn submit_repository(&mut self, reference: String) -> Result<()> {
        if reference.trim().is_empty() {
            return Ok(());
        }

        writeln!(self.out, "Loading...")?;
        match self.session.submit_repository(reference).await {
            IngestionOutcome::Acknowledged => {
                writeln!(self.out, "Repository submitted. Ask a question, or type /help.")?
            }
            IngestionOutcome::Failed(notice) => writeln!(self.err, "{}", render_notice(&notice))?,
            IngestionOutcome::Rejected(reason) => debug!(%reason, "repository submission ignored"),
        }
        Ok(())
    }

    async fn ask(&mut self, conversation: &ConversationController, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        writeln!(self.out, "Thinking...")?;
        match conversation.submit(text).await {
            SubmitOutcome::Answered(turn) => writeln!(self.out, "{}\n", render_turn(&turn))?,
            SubmitOutcome::Failed(notice) => writeln!(self.err, "{}", render_notice(&notice))?,
            SubmitOutcome::Rejected(reason) => debug!(%reason, "question ignored"),
            SubmitOutcome::Discarded => {}
        }
        Ok(())
    }

    async fn go_home(&mut self) -> Result<()> {
        if self.session.conversation().is_some() {
            self.session.back_home().await;
            writeln!(self.out, "Conversation closed.")?;
        }
        Ok(())
    }

    async fn print_history(&mut self) -> Result<()> {
        let Some(conversation) = self.session.conversation() else {
            writeln!(self.out, "No conversation yet.")?;
            return Ok(());
        };
        for turn in conversation.transcript().await {
            writeln!(self.out, "{}", render_turn(&turn))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
