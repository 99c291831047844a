//! Terminal UI layer for interactive chat sessions.
//!
//! The UI module owns rendering, layout, keyboard handling, and loop control
//! for the text user interface.
//!
//! Key submodules include:
//! - [`chat_loop`]: the main interaction loop that turns key presses into
//!   [`crate::core::app::AppAction`]s and coordinates streaming via
//!   [`crate::core::chat_stream`].
//! - [`renderer`], [`sidebar`], [`markdown`] and [`wrap`]: view composition
//!   and frame output.
//! - [`theme`]: color/style policy.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod sidebar;
pub mod theme;
pub mod wrap;
