//! Prompt assembly for completion calls.
//!
//! Builds the message array in a fixed order: system prompt, then the
//! report content as a second system entry when a report is attached,
//! then a trailing window of conversational history, then the new user
//! message. System-role ledger entries (upload events) never reach the
//! model; the window is applied after they are filtered out.

use clarimed_types::chat::ChatMessage;
use clarimed_types::config::PromptConfig;
use clarimed_types::llm::{Message, MessageRole};

use crate::budget::TokenBudgeter;

/// Ready-to-send prompt with its budget figures.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub messages: Vec<Message>,
    pub prompt_tokens: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("assembled prompt of {prompt_tokens} tokens leaves no usable reply budget")]
    TooLarge { prompt_tokens: u32 },
}

pub struct ContextAssembler {
    prompts: PromptConfig,
    budgeter: TokenBudgeter,
}

impl ContextAssembler {
    pub fn new(prompts: PromptConfig, budgeter: TokenBudgeter) -> Self {
        Self { prompts, budgeter }
    }

    pub fn prompts(&self) -> &PromptConfig {
        &self.prompts
    }

    /// Assembles the prompt and sizes the reply budget.
    ///
    /// `window` bounds how many conversational entries are retained,
    /// counted from the most recent after system entries are dropped.
    /// Fails when the prompt leaves less than the output floor.
    pub fn build(
        &self,
        report_text: Option<&str>,
        history: &[ChatMessage],
        new_message: &str,
        window: usize,
    ) -> Result<AssembledContext, ContextError> {
        let mut messages = Vec::with_capacity(window + 3);
        messages.push(Message::system(&self.prompts.system_prompt));

        if let Some(text) = report_text {
            messages.push(Message::system(format!(
                "{}\n\n{}",
                self.prompts.report_header, text
            )));
        }

        let conversational: Vec<&ChatMessage> = history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .collect();
        let start = conversational.len().saturating_sub(window);
        for entry in &conversational[start..] {
            messages.push(Message {
                role: entry.role,
                content: entry.content.clone(),
            });
        }

        messages.push(Message::user(new_message));

        let prompt_tokens = self.budgeter.estimate_tokens(&messages);
        let max_output_tokens = self.budgeter.output_ceiling(prompt_tokens);
        if !self.budgeter.is_usable(max_output_tokens) {
            return Err(ContextError::TooLarge { prompt_tokens });
        }

        Ok(AssembledContext {
            messages,
            prompt_tokens,
            max_output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarimed_types::config::BudgetConfig;
    use uuid::Uuid;

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(
            PromptConfig::default(),
            TokenBudgeter::new(BudgetConfig::default()),
        )
    }

    fn entry(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage::new(Uuid::now_v7(), "c1".to_string(), role, content.to_string(), None)
    }

    #[test]
    fn test_orders_system_report_history_question() {
        let history = vec![
            entry(MessageRole::User, "first question"),
            entry(MessageRole::Assistant, "first answer"),
        ];
        let ctx = assembler()
            .build(Some("Hemoglobin 11.2 g/dL"), &history, "what next?", 10)
            .unwrap();

        assert_eq!(ctx.messages.len(), 5);
        assert_eq!(ctx.messages[0].role, MessageRole::System);
        assert_eq!(ctx.messages[1].role, MessageRole::System);
        assert!(ctx.messages[1].content.starts_with("Medical Report Content:"));
        assert!(ctx.messages[1].content.ends_with("Hemoglobin 11.2 g/dL"));
        assert_eq!(ctx.messages[2].content, "first question");
        assert_eq!(ctx.messages[3].content, "first answer");
        assert_eq!(ctx.messages[4].role, MessageRole::User);
        assert_eq!(ctx.messages[4].content, "what next?");
    }

    #[test]
    fn test_no_report_means_single_system_message() {
        let ctx = assembler().build(None, &[], "hello", 10).unwrap();
        assert_eq!(ctx.messages.len(), 2);
        assert_eq!(ctx.messages[0].role, MessageRole::System);
        assert_eq!(ctx.messages[1].content, "hello");
    }

    #[test]
    fn test_upload_events_are_dropped_before_windowing() {
        let history = vec![
            entry(MessageRole::User, "q1"),
            entry(MessageRole::System, "Report uploaded: cbc.pdf"),
            entry(MessageRole::Assistant, "a1"),
        ];
        // Window of 2 keeps q1 and a1; the upload event does not consume a slot.
        let ctx = assembler().build(None, &history, "q2", 2).unwrap();
        let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(contents.contains(&"q1"));
        assert!(contents.contains(&"a1"));
        assert!(!contents.iter().any(|c| c.contains("Report uploaded")));
    }

    #[test]
    fn test_window_keeps_most_recent_entries() {
        let history = vec![
            entry(MessageRole::User, "old"),
            entry(MessageRole::Assistant, "older answer"),
            entry(MessageRole::User, "recent"),
            entry(MessageRole::Assistant, "recent answer"),
        ];
        let ctx = assembler().build(None, &history, "now", 2).unwrap();
        let contents: Vec<&str> = ctx.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(!contents.contains(&"old"));
        assert!(contents.contains(&"recent"));
        assert!(contents.contains(&"recent answer"));
    }

    #[test]
    fn test_oversized_report_fails_with_token_count() {
        let tight = BudgetConfig {
            context_window: 200,
            hard_output_cap: 32_768,
            safety_buffer: 50,
            min_output_floor: 100,
        };
        let assembler = ContextAssembler::new(PromptConfig::default(), TokenBudgeter::new(tight));
        let report = "x".repeat(4_000);
        let err = assembler
            .build(Some(&report), &[], "summarize", 10)
            .unwrap_err();
        match err {
            ContextError::TooLarge { prompt_tokens } => assert!(prompt_tokens > 200),
        }
    }

    #[test]
    fn test_reply_budget_shrinks_as_history_grows() {
        let a = assembler();
        let small = a.build(None, &[], "q", 10).unwrap();
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| entry(MessageRole::User, &format!("question number {i} with padding text")))
            .collect();
        let large = a.build(None, &history, "q", 10).unwrap();
        assert!(large.prompt_tokens > small.prompt_tokens);
        assert!(large.max_output_tokens <= small.max_output_tokens);
    }
}
