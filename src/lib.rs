//! Real-time synchronization and itinerary-rendering core for a transit
//! companion client.
//!
//! The crate polls live vehicle positions and trip updates into a
//! [`store::LiveDataStore`], reconciles displayed predictions against that
//! snapshot, follows a single tracked vehicle across restarts, and renders
//! time-correct itinerary text for direct and transfer journeys (including
//! overnight wrap-around arithmetic). Map rendering, geocoding and
//! notification UI are external collaborators behind the traits in [`api`]
//! and [`session`].

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod itinerary;
pub mod models;
pub mod poller;
pub mod reconciler;
pub mod session;
pub mod store;
