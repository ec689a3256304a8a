//! # webdriver-messenger
//!
//! [`WebDriverClient`] speaks the W3C WebDriver JSON protocol to a driver such as chromedriver.
//! [`WebMessenger`] drives a web messaging app with it and implements
//! [`harvest_core::Messenger`].

pub mod client;
pub mod config;
pub mod error;
pub mod messenger;

pub use client::{keys, Locator, WebDriverClient};
pub use config::WebDriverConfig;
pub use error::{Result, WebDriverError};
pub use messenger::{xpath_literal, WebMessenger, MIN_MESSAGE_CHARS};
