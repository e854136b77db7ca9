use std::io::Write;

use tracing::{debug, info};

use crate::config::Config;
use crate::conversation::{Conversation, Turn};
use crate::error::ArchpromptError;
use crate::input::LineSource;
use crate::providers::{CompletionRequest, Provider};
use crate::transcript::Transcript;

const NEXT_MESSAGE_HEADER: &str = "Next Message: (Press Enter to exit)";

/// Outcome of reading one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTurn {
    User(Turn),
    EndOfConversation,
}

/// Why `run` returned. Both are normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetReached,
    EndOfConversation,
}

/// Owns the conversation and mediates every call to the provider.
///
/// The turn budget from `Config::max_messages` is a hard cap on the number of
/// turns in the conversation. It is checked before each read and again before
/// each completion call, so a user line that lands on the last free slot is
/// recorded but not answered.
pub struct Driver<'a, L, W> {
    config: &'a Config,
    provider: &'a dyn Provider,
    input: L,
    transcript: Transcript<W>,
    conversation: Conversation,
}

impl<'a, L: LineSource, W: Write> Driver<'a, L, W> {
    /// Seed the conversation from the configured system prompt and request.
    pub fn new(
        config: &'a Config,
        provider: &'a dyn Provider,
        input: L,
        transcript: Transcript<W>,
    ) -> Self {
        Self {
            config,
            provider,
            input,
            transcript,
            conversation: Conversation::new(config.system_prompt(), config.user_message()),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_parts(self) -> (Conversation, L, Transcript<W>) {
        (self.conversation, self.input, self.transcript)
    }

    /// Send the full conversation to the provider and return its reply.
    /// Does not append; the caller does.
    pub async fn complete_turn(&self) -> Result<Turn, ArchpromptError> {
        let model = self.config.chosen_model();
        let request = CompletionRequest {
            model: &model.name,
            turns: self.conversation.turns(),
            max_tokens: self.config.max_tokens(),
            temperature: self.config.temperature(),
            json_object: true,
        };

        let completion = self.provider.complete(request).await?;

        if let Some(usage) = completion.usage {
            info!(
                provider = self.provider.name(),
                model = %model.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                estimated_cost_usd = model.estimate_cost(usage.prompt_tokens, usage.completion_tokens),
                "completion received"
            );
        }

        Ok(completion.turn)
    }

    /// Block on one line of input. A blank line, EOF, or interrupt ends the
    /// conversation; anything else becomes a user turn, verbatim.
    pub fn read_next_user_turn(&mut self) -> Result<NextTurn, ArchpromptError> {
        match self.input.read_line()? {
            Some(line) if !line.is_empty() => Ok(NextTurn::User(Turn::user(line))),
            _ => Ok(NextTurn::EndOfConversation),
        }
    }

    /// Print the seed, get the first reply, then alternate user lines and
    /// replies until the budget is used up or the user enters a blank line.
    ///
    /// A provider failure stops the run immediately and is returned as is.
    pub async fn run(&mut self) -> Result<StopReason, ArchpromptError> {
        self.print_intro()?;
        self.respond().await?;

        while self.has_room() {
            self.transcript.header(NEXT_MESSAGE_HEADER)?;
            let next = self.read_next_user_turn()?;

            match next {
                NextTurn::EndOfConversation => {
                    self.transcript.line("No message entered. Exiting.")?;
                    self.transcript.blank()?;
                    info!(turns = self.conversation.len(), "conversation ended by user");
                    return Ok(StopReason::EndOfConversation);
                }
                NextTurn::User(turn) => {
                    self.transcript.blank()?;
                    self.append(turn);
                }
            }

            if !self.has_room() {
                self.transcript.line("Message limit reached. Exiting.")?;
                self.transcript.blank()?;
                break;
            }

            self.respond().await?;
        }

        info!(
            turns = self.conversation.len(),
            budget = self.config.max_messages(),
            "turn budget reached"
        );
        Ok(StopReason::BudgetReached)
    }

    fn has_room(&self) -> bool {
        self.conversation.len() < self.config.max_messages()
    }

    fn append(&mut self, turn: Turn) {
        debug_assert!(self.has_room(), "append would exceed the turn budget");
        debug!(role = ?turn.role(), turns = self.conversation.len() + 1, "appending turn");
        self.conversation.push(turn);
    }

    async fn respond(&mut self) -> Result<(), ArchpromptError> {
        let reply = self.complete_turn().await?;
        self.transcript.reply("Response:", reply.content())?;
        self.append(reply);
        Ok(())
    }

    fn print_intro(&mut self) -> Result<(), ArchpromptError> {
        let model = self.config.chosen_model().name.clone();
        self.transcript.section("Model:", &model)?;

        let turns = self.conversation.turns();
        let prompt = turns[0].content().to_owned();
        let request = turns[1].content().to_owned();
        self.transcript.section("Prompt:", &prompt)?;
        self.transcript.section("Initial Request:", &request)
    }
}
