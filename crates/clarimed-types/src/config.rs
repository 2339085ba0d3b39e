//! Application configuration for Clarimed.
//!
//! `AppConfig` represents the `clarimed.toml` file that controls completion
//! sampling, token budgets, history windows, prompt copy, and upload policy.
//! Every field has a compiled-in default; a missing or empty file yields a
//! fully working configuration. Credentials never live in the file -- they
//! are resolved from the environment into [`Secrets`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level configuration for the Clarimed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub extract: ExtractConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            budget: BudgetConfig::default(),
            history: HistoryConfig::default(),
            prompt: PromptConfig::default(),
            upload: UploadConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

/// Completion service identity and sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Model identifier sent to the completion service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Upper bound on a single completion call, in seconds.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_top_p() -> f64 {
    0.9
}

fn default_completion_timeout_secs() -> u64 {
    120
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

/// Token budget limits for the completion context window.
///
/// These mirror the deployed model's published limits but are configuration,
/// not logic: switching providers means editing this section, not code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// Provider-imposed ceiling on `max_tokens` for a single completion.
    #[serde(default = "default_hard_output_cap")]
    pub hard_output_cap: u32,

    /// Headroom reserved against tokenizer estimation drift.
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer: u32,

    /// Below this output allowance the conversation is too large to answer.
    #[serde(default = "default_min_output_floor")]
    pub min_output_floor: u32,
}

fn default_context_window() -> u32 {
    131_072
}

fn default_hard_output_cap() -> u32 {
    32_768
}

fn default_safety_buffer() -> u32 {
    1_000
}

fn default_min_output_floor() -> u32 {
    100
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            hard_output_cap: default_hard_output_cap(),
            safety_buffer: default_safety_buffer(),
            min_output_floor: default_min_output_floor(),
        }
    }
}

/// Trailing history window sizes for context assembly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Window used when priming the automatic report explanation.
    #[serde(default = "default_explain_window")]
    pub explain_window: usize,

    /// Window used when answering a user question.
    #[serde(default = "default_ask_window")]
    pub ask_window: usize,
}

fn default_explain_window() -> usize {
    5
}

fn default_ask_window() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            explain_window: default_explain_window(),
            ask_window: default_ask_window(),
        }
    }
}

/// Assistant prompt copy: system prompt, report header, locale templates.
///
/// This is product copy shipped as data. Deployments may override it in
/// `clarimed.toml`, but the defaults below are the canonical text and must
/// not be hand-edited per environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Header line prepended to report text in the second system entry.
    #[serde(default = "default_report_header")]
    pub report_header: String,

    #[serde(default)]
    pub explain: ExplainTemplates,
}

impl PromptConfig {
    /// Instruction template for the auto-explanation in the given language.
    pub fn explain_template(&self, language: Language) -> &str {
        match language {
            Language::En => &self.explain.en,
            Language::Hi => &self.explain.hi,
            Language::Gu => &self.explain.gu,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            report_header: default_report_header(),
            explain: ExplainTemplates::default(),
        }
    }
}

/// Per-locale instruction templates for the automatic report explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainTemplates {
    #[serde(default = "default_explain_en")]
    pub en: String,

    #[serde(default = "default_explain_hi")]
    pub hi: String,

    #[serde(default = "default_explain_gu")]
    pub gu: String,
}

impl Default for ExplainTemplates {
    fn default() -> Self {
        Self {
            en: default_explain_en(),
            hi: default_explain_hi(),
            gu: default_explain_gu(),
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_report_header() -> String {
    "Medical Report Content:".to_string()
}

fn default_explain_en() -> String {
    "Please explain this medical report in simple English. Summarize the key findings, \
     point out any values outside normal ranges, and suggest what the patient may want \
     to discuss with their doctor."
        .to_string()
}

fn default_explain_hi() -> String {
    "कृपया इस मेडिकल रिपोर्ट को सरल हिंदी में समझाइए। मुख्य निष्कर्षों का सारांश दीजिए, \
     सामान्य सीमा से बाहर के मानों को बताइए, और बताइए कि मरीज़ को डॉक्टर से किन बातों पर \
     चर्चा करनी चाहिए।"
        .to_string()
}

fn default_explain_gu() -> String {
    "કૃપા કરીને આ મેડિકલ રિપોર્ટ સરળ ગુજરાતીમાં સમજાવો. મુખ્ય તારણોનો સારાંશ આપો, સામાન્ય \
     મર્યાદાની બહારનાં મૂલ્યો જણાવો, અને જણાવો કે દર્દીએ ડૉક્ટર સાથે કઈ બાબતોની ચર્ચા કરવી જોઈએ."
        .to_string()
}

/// Canonical assistant behavioral policy. Reproduced verbatim, including
/// spacing quirks; downstream prompts depend on this exact text.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful medical assistant that explains medical reports in simple language. 

IMPORTANT INSTRUCTIONS:

1. You are a helpful medical assistant that answers questions related to **medical reports, medical tests, and healthcare in general**.
2. Automatically detect the user's language from their question and respond in the SAME language (Hindi, English, Gujarati).
3. Explain medical terms in simple, easy-to-understand language.
4. Be empathetic and supportive.
5. If you see concerning values in the report, gently suggest consulting a doctor.
6. Never provide definitive diagnoses – only explain what the report shows.
7. Keep responses concise but informative.
8. For any questions NOT related to medical reports or general medical/healthcare advice (e.g.,  pricing, app development, unrelated topics), politely refuse with a short message:
   "I'm sorry, I can only help with medical reports or healthcare-related questions."

DEVELOPER INFORMATION:
- If asked who developed this chatbot, reply: "This medical report analyzer was developed by Prakash Bokarvadiya using AI technology."
- If asked for contact information: 
  Email: prakasbokarvadiya0@gmail.com
  LinkedIn: https://www.linkedin.com/in/prakash-bokarvadiya-609001369
- The AI model used is  Medical Report Analyzer Pro version 1.0 by prakash bokarvadiya, but the application itself was built by Prakash Bokarvadiya

When a medical report is provided, analyze it and answer questions about:
- Test results and their meanings
- Normal vs abnormal values
- Medicines mentioned
- Health recommendations related to the report
- Any medical terminology
- General healthcare questions (like basic health tips, precautions, wellness) if related to medical knowledge
"#;

/// Supported languages for the automatic report explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Gu,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Hi => write!(f, "hi"),
            Language::Gu => write!(f, "gu"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "hi" | "hindi" => Ok(Language::Hi),
            "gu" | "gujarati" => Ok(Language::Gu),
            other => Err(format!("unsupported language: '{other}'")),
        }
    }
}

/// Upload acceptance policy for report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,

    /// Lowercase filename extensions accepted for analysis.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_upload_bytes() -> u64 {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["pdf", "png", "jpg", "jpeg", "gif", "bmp", "tiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploadConfig {
    /// Whether a filename carries an accepted extension.
    pub fn allows(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|a| *a == ext)
            })
            .unwrap_or(false)
    }
}

/// Extraction sidecar endpoint and quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_extract_base_url")]
    pub base_url: String,

    #[serde(default = "default_extract_timeout_secs")]
    pub timeout_secs: u64,

    /// Extracted text shorter than this is rejected as unreadable.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

fn default_extract_base_url() -> String {
    "http://127.0.0.1:5055".to_string()
}

fn default_extract_timeout_secs() -> u64 {
    60
}

fn default_min_text_chars() -> usize {
    10
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: default_extract_base_url(),
            timeout_secs: default_extract_timeout_secs(),
            min_text_chars: default_min_text_chars(),
        }
    }
}

/// Credentials resolved from the environment, never from `clarimed.toml`.
#[derive(Clone)]
pub struct Secrets {
    /// API key for the completion service (`GROQ_API_KEY`).
    pub completion_api_key: Option<SecretString>,

    /// Shared secret for payment callback signatures (`CLARIMED_MERCHANT_SECRET`).
    pub merchant_secret: Option<SecretString>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("completion_api_key", &self.completion_api_key.is_some())
            .field("merchant_secret", &self.merchant_secret.is_some())
            .finish()
    }
}
