//! # esplink — terminal front-end
//!
//! Opens the serial link to the peer, prints chat and upload events,
//! and turns stdin lines into text sends and image uploads.

pub mod command;
pub mod config;
