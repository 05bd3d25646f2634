#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod asynch;
mod bus;
pub mod calibration;
mod clock;
pub mod codec;
pub mod command;
mod config;
mod driver;
mod error;
pub mod flow;
mod state;

pub use asynch::Sfm3019Async;
pub use bus::BusFault;
pub use calibration::{Calibration, FlowUnit};
pub use clock::Clock;
pub use command::{Command, GasMode};
pub use config::Config;
pub use driver::Sfm3019;
pub use error::Error;
pub use state::{Session, State};
