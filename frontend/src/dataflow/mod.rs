//! Core dataflow primitives for the content script
//!
//! These pieces are independent of YouTube and of the DOM. They give the
//! rest of the crate one way to move events around and one way to own time.
//!
//! # Core Components
//!
//! - **[`Relay`]** - Type-safe event streaming using simple channels
//! - **[`Task`]** / **[`TaskHandle`]** - Local tasks aborted when their handle drops
//! - **[`Timer`]** - Cancelable sleeps (gloo-timers in the browser, tokio natively)
//! - **[`Debouncer`]** - Trailing-edge debounce windows
//!
//! # Architecture Principles
//!
//! 1. **Handles Own Timers** - Every timer lives inside a task whose handle has one owner
//! 2. **Event-Source Naming** - Relays follow `{source}_{event}_relay` pattern
//! 3. **Single Thread** - `Rc`/`RefCell` state, never held across an `.await`

pub mod relay;
pub mod task;
pub mod timer;
pub mod debounce;

pub use relay::{Relay, relay};
pub use task::{Task, TaskHandle};
pub use timer::Timer;
pub use debounce::Debouncer;
