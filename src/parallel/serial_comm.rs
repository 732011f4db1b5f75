//! Single-rank communicator.
//!
//! All collectives are identities and point-to-point messages can only be
//! self-sends, kept in an internal queue. Scatter plans built on one rank
//! route everything through their local copy lists, so the queue is
//! normally untouched.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use super::Comm;

#[derive(Default)]
pub struct SerialComm {
    queue: RefCell<HashMap<u16, VecDeque<Vec<f64>>>>,
}

impl SerialComm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}
    fn all_reduce(&self, x: f64) -> f64 {
        x
    }
    fn send(&self, peer: usize, tag: u16, buf: &[f64]) {
        assert_eq!(peer, 0, "serial communicator has a single rank");
        self.queue
            .borrow_mut()
            .entry(tag)
            .or_default()
            .push_back(buf.to_vec());
    }
    fn recv(&self, peer: usize, tag: u16) -> Vec<f64> {
        assert_eq!(peer, 0, "serial communicator has a single rank");
        self.queue
            .borrow_mut()
            .get_mut(&tag)
            .and_then(|q| q.pop_front())
            .expect("recv with no matching send on serial communicator")
    }
}
