//! In-memory channel used by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ev3_serial::channel::Channel;
use ev3_serial::errors::ChannelError;
use ev3_serial::protocol::Bytecode;
use ev3_serial::{Ev3, JobState};

/// One transport operation as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(Vec<u8>),
    End(Vec<u8>),
}

/// What the mock saw, shared with the test.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<Event>>>);

impl Log {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    /// Every bytecode that reached the transport, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Begin(b) => Some(b.clone()),
                Event::End(_) => None,
            })
            .collect()
    }
}

/// Replays scripted replies. Missing replies are answered with zeros
/// of the requested length after the three byte header.
pub struct MockChannel {
    replies: VecDeque<Result<Vec<u8>, ChannelError>>,
    delay: Duration,
    log: Log,
}

impl MockChannel {
    pub fn new() -> (Self, Log) {
        let log = Log::default();
        (
            MockChannel {
                replies: VecDeque::new(),
                delay: Duration::ZERO,
                log: log.clone(),
            },
            log,
        )
    }

    pub fn reply(mut self, reply: Result<Vec<u8>, ChannelError>) -> Self {
        self.replies.push_back(reply);
        self
    }

    /// How long every transport operation takes.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn operate(&mut self, bytecode: &Bytecode) {
        self.log.0.lock().push(Event::Begin(bytecode.as_bytes().to_vec()));
        std::thread::sleep(self.delay);
        self.log.0.lock().push(Event::End(bytecode.as_bytes().to_vec()));
    }
}

impl Channel for MockChannel {
    fn send_no_reply(&mut self, bytecode: &Bytecode) -> Result<(), ChannelError> {
        self.operate(bytecode);
        Ok(())
    }

    fn send(
        &mut self,
        expected_reply_length: u16,
        bytecode: &Bytecode,
    ) -> Result<Vec<u8>, ChannelError> {
        self.operate(bytecode);
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(vec![0; 3 + expected_reply_length as usize]))
    }
}

/// Polls until the EV3 is idle, failing the test after a few seconds.
pub fn wait_idle(ev3: &Ev3) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while ev3.state() == JobState::Running {
        assert!(Instant::now() < deadline, "job did not finish in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}
