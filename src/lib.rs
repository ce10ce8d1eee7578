//! Core engine for a case-interview practice tool: the case library,
//! casebook viewing, spoken self-feedback capture, AI feedback generation,
//! scoring, and the history dashboard. Rendering, speech recognition, and
//! the feedback proxy are host concerns reached through capability traits
//! and an HTTP client; everything here is plain state that a frontend
//! drives with [`session::SessionEvent`]s.

pub mod analytics;
pub mod casebook;
pub mod catalog;
pub mod feedback;
pub mod profile;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod transcript;
