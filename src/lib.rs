//! agentmon: poll-and-render monitor for conversational-agent interaction
//! logs.
//!
//! The library exposes the refresh core (Log Store, Poller, Feedback
//! Updater, Derived View) and the surfaces built on it (terminal and web
//! dashboards).

pub mod api;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod feedback;
pub mod logs;
pub mod poller;
pub mod view;
pub mod web;
