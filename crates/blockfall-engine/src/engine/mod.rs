//! Playfield rules and game flow.
//!
//! This module drives the core data structures frame by frame:
//!
//! - [`Well`] - The playfield state machine (board, active piece, timers, line clears)
//! - [`GameSession`] - A game: a well fed by a piece queue, with hold and statistics
//! - [`GameStats`] - Locked pieces and cleared lines
//! - [`PieceQueue`] - 7-bag piece generation with a preview window
//! - [`PieceSeed`] - Seed for deterministic piece generation
//! - [`WellConfig`] - Timing and rule settings
//!
//! # Frame Flow
//!
//! Each call to [`Well::update`] runs, in order:
//!
//! 1. Advance animations and drop finished ones
//! 2. Stop if the game is over
//! 3. If cleared rows are pending, remove them once the blocking animations
//!    are gone and request the next piece
//! 4. Apply the frame's input events and edge actions (hard drop, hold); a
//!    hold press on a falling piece ends the frame here
//! 5. Rotation, horizontal auto-repeat and soft drop timers
//! 6. Gravity, then lock delay
//!
//! Events emitted along the way go to observers at once and are queued for
//! [`Well::take_events`]; [`GameSession`] reacts to them after the frame.
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{Button, GameSession, InputEvent, PieceSeed, WellConfig};
//!
//! let seed: PieceSeed = "0123456789abcdef0123456789abcdef".parse().unwrap();
//! let mut session = GameSession::with_seed(WellConfig::default(), seed);
//!
//! session.update(&[InputEvent::press(Button::Left)]);
//! session.update(&[InputEvent::release(Button::Left)]);
//! session.update(&[InputEvent::press(Button::HardDrop)]);
//!
//! assert_eq!(session.stats().completed_pieces(), 1);
//! println!("{}", session.well().as_ascii());
//! ```

pub use self::{
    animation::*, config::*, event::*, game_session::*, game_stats::*, input::*, piece_queue::*,
    timer::*, well::*,
};

mod animation;
mod config;
mod event;
mod game_session;
mod game_stats;
mod input;
mod piece_queue;
mod timer;
mod well;
