//! Whisker Core Types
//!
//! This crate provides the runtime types shared by the Whisker template
//! engine. It includes:
//!
//! - **Values**: The dynamically typed [`Value`] model, truthiness rules and
//!   the [`Object`] capability for host-defined members ([`value`] module)
//! - **Operators**: Named comparison predicates used by the `is` tag
//!   ([`operator`] module)
//! - **HTML**: Output escaping ([`html`] module)

pub mod html;
pub mod operator;
pub mod value;

pub use value::{Object, Value, ValueKind};
