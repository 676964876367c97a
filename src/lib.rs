//! Slotline - slot-filling conversations for voice assistants
//!
//! A language model talks to the user and calls two tools per assistant: one
//! merges the details it heard into a structured form, the other completes
//! the form. Completion persists the record, announces it to observers, and
//! starts a fresh form.
//!
//! - [`slots`] the forms and their merge and completeness rules
//! - [`session`] per-conversation state, completion ordering, and the registry
//! - [`store`] JSON files for completed records
//! - [`notify`] delivery of completion notifications
//! - [`assistant`] the barista and wellness assistants and their tools
//! - [`api`] HTTP and WebSocket surface for the conversation driver
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        Conversation driver (LLM agent)        │
//! └──────────────────────┬───────────────────────┘
//!                        │ tool calls
//! ┌──────────────────────▼───────────────────────┐
//! │   Session registry  →  Assistant  →  Form    │
//! └───────────┬──────────────────────┬───────────┘
//!             │ save                 │ deliver
//! ┌───────────▼──────────┐ ┌─────────▼───────────┐
//! │  Order file / log    │ │ WebSocket / webhook │
//! └──────────────────────┘ └─────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod slots;
pub mod store;

pub use assistant::{Assistant, AssistantFactory, AssistantKind};
pub use config::Config;
pub use error::{Error, Result};
pub use notify::{BroadcastNotifier, Notification, Notifier, WebhookNotifier};
pub use session::{Completion, Conversation, Disposition, SessionRegistry};
pub use slots::{CheckIn, CheckInEntry, CoffeeOrder, CompletionGate, SlotForm};
pub use store::{CheckInLog, OrderFile, RecordStore};
