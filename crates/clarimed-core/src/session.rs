//! Session orchestration: report analysis and quota-gated question answering.
//!
//! `SessionOrchestrator` owns the sequencing rules of the write path:
//!
//! - a question is charged when its ledger entry lands, not when the model
//!   answers; failures after the append do not refund it
//! - the automatic report explanation is an instruction, not a ledger entry,
//!   and consumes no quota
//! - a report upload leaves a system-role event in the ledger so the session
//!   records when the document entered the conversation

use std::time::Duration;

use chrono::Utc;
use clarimed_types::chat::{ChatMessage, MessageRole};
use clarimed_types::config::{AppConfig, CompletionConfig, HistoryConfig, Language};
use clarimed_types::error::{ExtractError, RepositoryError};
use clarimed_types::llm::{CompletionRequest, CompletionResponse, LlmError, TokenUsage};
use clarimed_types::report::Report;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::budget::TokenBudgeter;
use crate::chat::ledger::ChatLedger;
use crate::context::{AssembledContext, ContextAssembler, ContextError};
use crate::extract::{FileKind, TextExtractor};
use crate::llm::provider::CompletionBackend;
use crate::quota::QuotaGate;
use crate::report::ReportStore;
use crate::subscription::store::{ActivationLog, UserStore};

/// Errors from report analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// The file was readable but yielded too little text to analyze.
    #[error("extracted text too short to analyze ({chars} characters)")]
    ExtractionQuality { chars: usize },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from asking a question.
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("question must not be empty")]
    EmptyQuestion,

    /// The assembled prompt left less than the minimum reply budget.
    /// The question is already in the ledger when this is returned.
    #[error("conversation of {prompt_tokens} tokens exceeds the model context window")]
    ContextTooLarge { prompt_tokens: u32 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("completion failed: {0}")]
    Upstream(#[from] LlmError),
}

impl From<ContextError> for AskError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::TooLarge { prompt_tokens } => AskError::ContextTooLarge { prompt_tokens },
        }
    }
}

/// A delivered answer, with the quota position after charging this question.
#[derive(Debug, Clone)]
pub struct AnswerDetail {
    pub chat_id: String,
    pub reply: String,
    /// Questions consumed in this session, including this one.
    pub used: u32,
    /// The plan's allowance, or `None` for unlimited plans.
    pub limit: Option<u32>,
    /// Display name of the governing plan.
    pub plan: String,
    pub usage: TokenUsage,
}

/// A question refused because the session's allowance is spent.
#[derive(Debug, Clone)]
pub struct QuotaDenial {
    pub plan: String,
    pub used: u32,
    pub limit: Option<u32>,
}

/// Business outcome of an ask. Denial is an outcome, not an error.
#[derive(Debug, Clone)]
pub enum AskOutcome {
    Answered(AnswerDetail),
    QuotaExceeded(QuotaDenial),
}

impl AskOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, AskOutcome::Answered(_))
    }
}

/// Result of a successful report upload.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub chat_id: String,
    pub report_id: Uuid,
    pub extracted_text: String,
    /// The automatic first explanation, absent when that best-effort
    /// step failed.
    pub explanation: Option<String>,
}

fn upload_event_content(filename: &str) -> String {
    format!("Report uploaded: {filename}")
}

/// Coordinates extraction, persistence, quota, context assembly, and the
/// completion backend for one user request at a time.
///
/// Generic over the repository and collaborator traits so clarimed-core
/// never depends on clarimed-infra.
pub struct SessionOrchestrator<U, A, L, R, X, B>
where
    U: UserStore,
    A: ActivationLog,
    L: ChatLedger,
    R: ReportStore,
    X: TextExtractor,
    B: CompletionBackend,
{
    quota: QuotaGate<U, A, L>,
    ledger: L,
    reports: R,
    extractor: X,
    backend: B,
    assembler: ContextAssembler,
    completion: CompletionConfig,
    history: HistoryConfig,
    min_report_chars: usize,
}

impl<U, A, L, R, X, B> SessionOrchestrator<U, A, L, R, X, B>
where
    U: UserStore,
    A: ActivationLog,
    L: ChatLedger,
    R: ReportStore,
    X: TextExtractor,
    B: CompletionBackend,
{
    pub fn new(
        quota: QuotaGate<U, A, L>,
        ledger: L,
        reports: R,
        extractor: X,
        backend: B,
        config: &AppConfig,
    ) -> Self {
        Self {
            quota,
            ledger,
            reports,
            extractor,
            backend,
            assembler: ContextAssembler::new(
                config.prompt.clone(),
                TokenBudgeter::new(config.budget),
            ),
            completion: config.completion.clone(),
            history: config.history,
            min_report_chars: config.extract.min_text_chars,
        }
    }

    /// Extract an uploaded report, persist it, and explain it.
    ///
    /// Nothing is written until the extracted text passes the quality
    /// gate, so a rejected upload leaves no trace. The explanation step
    /// is best-effort; its failure never fails the upload.
    pub async fn analyze_report(
        &self,
        user_id: Uuid,
        chat_id: Option<String>,
        filename: &str,
        data: &[u8],
        language: Language,
    ) -> Result<AnalyzeOutcome, AnalyzeError> {
        let kind = FileKind::from_filename(filename)
            .ok_or_else(|| ExtractError::UnsupportedType(filename.to_string()))?;

        let raw = self.extractor.extract(data, kind).await?;
        let text = raw.trim();
        let chars = text.chars().count();
        if chars < self.min_report_chars {
            return Err(AnalyzeError::ExtractionQuality { chars });
        }

        let chat_id = chat_id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let report = Report {
            id: Uuid::now_v7(),
            user_id,
            filename: filename.to_string(),
            content: text.to_string(),
            uploaded_at: Utc::now(),
        };
        self.reports.save(&report).await?;

        let event = ChatMessage::new(
            user_id,
            chat_id.clone(),
            MessageRole::System,
            upload_event_content(filename),
            Some(report.id),
        );
        self.ledger.append(&event).await?;

        info!(%user_id, chat_id, report_id = %report.id, chars, "Report stored");

        let explanation = self.auto_explain(user_id, &chat_id, &report, language).await;

        Ok(AnalyzeOutcome {
            chat_id,
            report_id: report.id,
            extracted_text: report.content,
            explanation,
        })
    }

    /// Answer one user question within a session.
    ///
    /// The question is appended (and therefore charged) before the
    /// completion call; a backend failure afterwards leaves the question
    /// in the ledger. History is read before the append so the window
    /// never contains the new question twice.
    pub async fn ask(
        &self,
        user_id: Uuid,
        chat_id: Option<String>,
        question: &str,
        report_id: Option<Uuid>,
    ) -> Result<AskOutcome, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let chat_id = chat_id.unwrap_or_else(|| Uuid::now_v7().to_string());

        let decision = self.quota.can_ask(&user_id, &chat_id).await?;
        if !decision.allowed {
            debug!(
                %user_id,
                chat_id,
                plan = %decision.plan.id,
                used = decision.used,
                "Question refused: session allowance spent"
            );
            return Ok(AskOutcome::QuotaExceeded(QuotaDenial {
                plan: decision.plan.display_name,
                used: decision.used,
                limit: decision.plan.questions_per_chat.limit(),
            }));
        }

        let history = self
            .ledger
            .history(&user_id, &chat_id, self.history.ask_window as u32)
            .await?;

        let user_message = ChatMessage::new(
            user_id,
            chat_id.clone(),
            MessageRole::User,
            question,
            report_id,
        );
        self.ledger.append(&user_message).await?;

        let report = match report_id {
            Some(id) => {
                let found = self.reports.get(&user_id, &id).await?;
                if found.is_none() {
                    debug!(%user_id, report_id = %id, "Referenced report missing; answering without it");
                }
                found
            }
            None => None,
        };

        let context = self.assembler.build(
            report.as_ref().map(|r| r.content.as_str()),
            &history,
            question,
            self.history.ask_window,
        )?;

        let request = self.completion_request(context);
        let response = self.complete_with_deadline(&request).await?;

        let assistant_message = ChatMessage::new(
            user_id,
            chat_id.clone(),
            MessageRole::Assistant,
            response.content.clone(),
            report_id,
        );
        self.ledger.append(&assistant_message).await?;

        info!(
            %user_id,
            chat_id,
            plan = %decision.plan.id,
            used = decision.used + 1,
            completion_tokens = response.usage.completion_tokens,
            "Question answered"
        );

        Ok(AskOutcome::Answered(AnswerDetail {
            chat_id,
            reply: response.content,
            used: decision.used + 1,
            limit: decision.plan.questions_per_chat.limit(),
            plan: decision.plan.display_name,
            usage: response.usage,
        }))
    }

    /// Best-effort first explanation of a freshly stored report.
    ///
    /// The locale template takes the user slot of the prompt but is never
    /// persisted; only the assistant reply lands in the ledger. Any
    /// failure downgrades to a missing explanation.
    async fn auto_explain(
        &self,
        user_id: Uuid,
        chat_id: &str,
        report: &Report,
        language: Language,
    ) -> Option<String> {
        let instruction = self.assembler.prompts().explain_template(language).to_string();

        let history = match self
            .ledger
            .history(&user_id, chat_id, self.history.explain_window as u32)
            .await
        {
            Ok(history) => history,
            Err(err) => {
                warn!(%user_id, chat_id, error = %err, "Auto-explanation skipped: history unavailable");
                return None;
            }
        };

        let context = match self.assembler.build(
            Some(&report.content),
            &history,
            &instruction,
            self.history.explain_window,
        ) {
            Ok(context) => context,
            Err(err) => {
                warn!(%user_id, chat_id, error = %err, "Auto-explanation skipped: report too large");
                return None;
            }
        };

        let request = self.completion_request(context);
        let reply = match self.complete_with_deadline(&request).await {
            Ok(response) => response.content,
            Err(err) => {
                warn!(%user_id, chat_id, error = %err, "Auto-explanation failed");
                return None;
            }
        };

        let message = ChatMessage::new(
            user_id,
            chat_id,
            MessageRole::Assistant,
            reply.clone(),
            Some(report.id),
        );
        if let Err(err) = self.ledger.append(&message).await {
            warn!(%user_id, chat_id, error = %err, "Auto-explanation reply not persisted");
            return None;
        }

        Some(reply)
    }

    fn completion_request(&self, context: AssembledContext) -> CompletionRequest {
        CompletionRequest {
            model: self.completion.model.clone(),
            messages: context.messages,
            max_tokens: context.max_output_tokens,
            temperature: Some(self.completion.temperature),
            top_p: Some(self.completion.top_p),
        }
    }

    async fn complete_with_deadline(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let deadline = Duration::from_secs(self.completion.timeout_secs);
        match tokio::time::timeout(deadline, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(deadline.as_millis() as u64)),
        }
    }
}
