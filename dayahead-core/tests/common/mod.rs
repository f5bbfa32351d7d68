//! Shared fixtures: a scripted transport and a sleeper that records instead of sleeping.

#![allow(dead_code)]

use chrono::NaiveDate;
use dayahead_core::data::{HttpResponse, Sleeper, Transport, TransportError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

pub type Reply = Result<HttpResponse, TransportError>;

/// Replays canned replies in order and records every requested URL.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    pub requests: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request: {url}"))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
