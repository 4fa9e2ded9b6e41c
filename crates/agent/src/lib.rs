//! Chat pipeline for the bill-payment gateway.
//!
//! A message goes through a fixed, constrained loop:
//! 1. **Intent extraction** (`conversation`): the model translates free text into
//!    a JSON intent, which is parsed and validated. Anything malformed becomes
//!    `UNKNOWN`.
//! 2. **Guardrails** (`guardrails`): each intent declares its required fields;
//!    an incomplete intent never reaches the backend.
//! 3. **Dispatch** (`dispatch`): one backend operation per intent, two for the
//!    detailed view.
//! 4. **Response gate** (`response`): conversational intents reply verbatim;
//!    executed results are summarized by the model.
//!
//! The model never decides what is executed beyond naming the intent. Amounts,
//! months and subscriber numbers are validated before any call is made.

pub mod conversation;
pub mod dispatch;
pub mod guardrails;
pub mod llm;
pub mod response;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;

pub use llm::{GeminiClient, LlmClient, LlmError};
pub use runtime::{AgentRuntime, ChatReply, PipelineError};
