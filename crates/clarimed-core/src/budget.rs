//! Token budgeting for the completion context window.
//!
//! Estimates the token cost of a message list and derives the largest safe
//! output allowance. The estimator is deliberately approximate: four
//! characters per token over role and content, plus a fixed framing cost
//! per message and a reply-priming cost at the end. It never fails, which
//! is the property the rest of the pipeline relies on.

use clarimed_types::config::BudgetConfig;
use clarimed_types::llm::Message;

/// Fixed token framing cost contributed by every message.
const PER_MESSAGE_OVERHEAD: u32 = 4;

/// Fixed cost accounting for priming the assistant's reply.
const REPLY_PRIMING: u32 = 2;

/// Derives prompt-token estimates and output ceilings for one model profile.
///
/// Pure and deterministic: the same message list always yields the same
/// estimate. No caching, no retries.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgeter {
    limits: BudgetConfig,
}

impl TokenBudgeter {
    pub fn new(limits: BudgetConfig) -> Self {
        Self { limits }
    }

    /// Estimate the prompt-token cost of a message list.
    ///
    /// Per message: fixed framing overhead plus the encoded length of the
    /// role and content strings at four characters per token (rounded up).
    /// A final fixed cost covers reply priming.
    pub fn estimate_tokens(&self, messages: &[Message]) -> u32 {
        let mut total: u32 = 0;
        for message in messages {
            total = total.saturating_add(PER_MESSAGE_OVERHEAD);
            total = total.saturating_add(approx_tokens(&message.role.to_string()));
            total = total.saturating_add(approx_tokens(&message.content));
        }
        total.saturating_add(REPLY_PRIMING)
    }

    /// Largest output allowance for a prompt of the given size.
    ///
    /// `min(hard_output_cap, context_window - prompt - safety_buffer)`,
    /// saturating at zero. Callers compare the result against
    /// [`BudgetConfig::min_output_floor`] before attempting a completion.
    pub fn output_ceiling(&self, prompt_tokens: u32) -> u32 {
        let available = self
            .limits
            .context_window
            .saturating_sub(prompt_tokens)
            .saturating_sub(self.limits.safety_buffer);
        self.limits.hard_output_cap.min(available)
    }

    /// Whether an output ceiling is large enough to be worth a call.
    pub fn is_usable(&self, ceiling: u32) -> bool {
        ceiling >= self.limits.min_output_floor
    }

    pub fn limits(&self) -> &BudgetConfig {
        &self.limits
    }
}

/// Character-count approximation: ceil(chars / 4). Counts Unicode scalar
/// values, so Devanagari and Gujarati text is not penalized by byte length.
fn approx_tokens(s: &str) -> u32 {
    (s.chars().count() as u32).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarimed_types::llm::Message;

    fn budgeter() -> TokenBudgeter {
        TokenBudgeter::new(BudgetConfig::default())
    }

    #[test]
    fn test_empty_message_list_costs_only_priming() {
        assert_eq!(budgeter().estimate_tokens(&[]), REPLY_PRIMING);
    }

    #[test]
    fn test_single_message_estimate() {
        // "user" -> 1 token, "12345678" -> 2 tokens, +4 framing, +2 priming
        let messages = vec![Message::user("12345678")];
        assert_eq!(budgeter().estimate_tokens(&messages), 4 + 1 + 2 + 2);
    }

    #[test]
    fn test_estimate_rounds_up() {
        // 5 chars -> ceil(5/4) = 2 tokens of content
        let messages = vec![Message::user("abcde")];
        assert_eq!(budgeter().estimate_tokens(&messages), 4 + 1 + 2 + 2);
    }

    #[test]
    fn test_estimate_monotonic_in_content_length() {
        let b = budgeter();
        let mut previous = 0;
        for len in [0usize, 1, 10, 100, 1_000, 50_000] {
            let messages = vec![Message::user("x".repeat(len))];
            let estimate = b.estimate_tokens(&messages);
            assert!(estimate >= previous, "estimate shrank at len {len}");
            previous = estimate;
        }
    }

    #[test]
    fn test_estimate_counts_unicode_scalars_not_bytes() {
        let b = budgeter();
        // Both are 7 scalar values; the Devanagari string is 21 bytes.
        let hindi = vec![Message::user("रिपोर्ट")];
        let ascii = vec![Message::user("reports")];
        assert_eq!(b.estimate_tokens(&hindi), b.estimate_tokens(&ascii));
    }

    #[test]
    fn test_output_ceiling_small_prompt_hits_hard_cap() {
        let b = budgeter();
        // 131072 - 1000 - small prompt is far above the 32768 cap
        assert_eq!(b.output_ceiling(100), 32_768);
    }

    #[test]
    fn test_output_ceiling_large_prompt_shrinks() {
        let b = budgeter();
        // 131072 - 120000 - 1000 = 10072
        assert_eq!(b.output_ceiling(120_000), 10_072);
    }

    #[test]
    fn test_output_ceiling_saturates_at_zero() {
        let b = budgeter();
        assert_eq!(b.output_ceiling(131_072), 0);
        assert_eq!(b.output_ceiling(u32::MAX), 0);
    }

    #[test]
    fn test_usable_floor() {
        let b = budgeter();
        assert!(b.is_usable(100));
        assert!(b.is_usable(32_768));
        assert!(!b.is_usable(99));
        assert!(!b.is_usable(0));
    }
}
