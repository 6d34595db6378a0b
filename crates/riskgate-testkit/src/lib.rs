//! riskgate testing infrastructure
//!
//! Clocks, stub components and fixtures shared by the integration tests of
//! every riskgate crate.
//!
//! # Usage
//!
//! Add this to a crate's `Cargo.toml` dev-dependencies and use it from the
//! crate's `tests/` directory:
//! ```toml
//! [dev-dependencies]
//! riskgate-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod processors;
pub mod providers;
pub mod rules;
pub mod strategies;
pub mod time;

pub use fixtures::*;
pub use processors::{FailingProcessor, PanickingProcessor, SlowProcessor, StubProcessor};
pub use providers::StubProvider;
pub use rules::{FailingRule, StubRule};
pub use strategies::*;
pub use time::{epoch_time, ManualClock};
