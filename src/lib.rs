//! scoopdesk - form intake and transactional email for the shop website.
//!
//! Contact and event booking forms are rate limited, validated, sanitized and
//! delivered to the shop's inbox through a transactional email provider.

#![allow(clippy::should_implement_trait)]

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod mail;
pub mod models;
pub mod rate_limit;
pub mod server;
pub mod utils;
pub mod validation;
