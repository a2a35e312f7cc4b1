pub mod calendar;
pub mod client;
pub mod normalizer;
pub mod resolver;
pub mod store;

pub use client::{AladhanClient, CalendarSource, FetchError};
pub use resolver::resolve;
pub use store::{FetchTicket, LoadState, TimetableStore};
