//! Serializes commands from many callers onto one [Channel].
//!
//! The direct command protocol carries no correlation beyond send order,
//! so a single worker thread drains the queue and performs exactly one
//! transport operation at a time. Replies resolve their [Pending] in the
//! order the commands were queued.

use std::thread::JoinHandle;

use tokio::sync::mpsc;

use super::Channel;
use crate::errors::ChannelError;
use crate::pending::{Pending, Resolver};
use crate::protocol::{Bytecode, Reply};

/// Name of the spooler worker thread.
pub const SPOOLER_THREAD_NAME: &str = "ev3-spooler";

/// A queued command waiting for the transport.
enum Request {
    NoReply(Bytecode),
    Reply {
        expected_reply_length: u16,
        bytecode: Bytecode,
        resolver: Resolver<Reply>,
    },
}

/// Non-blocking front of a blocking [Channel].
///
/// The queue is unbounded. Dropping the [AsyncChannel] lets the worker
/// finish what is already queued, then joins it.
pub struct AsyncChannel {
    queue: Option<mpsc::UnboundedSender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncChannel {
    /// Moves `channel` onto a new spooler thread.
    pub fn new<C: Channel + 'static>(channel: C) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = std::thread::Builder::new()
            .name(SPOOLER_THREAD_NAME.to_string())
            .spawn(move || spool(channel, rx))?;

        Ok(AsyncChannel {
            queue: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queues a command that produces no reply.
    ///
    /// Transport failures are logged by the worker, they are not reported here.
    pub fn send_no_reply(&self, bytecode: Bytecode) -> Result<(), ChannelError> {
        tracing::debug!(len = bytecode.len(), "queueing command without reply");
        self.enqueue(Request::NoReply(bytecode))
    }

    /// Queues a command and returns a handle to its reply.
    pub fn send(&self, expected_reply_length: u16, bytecode: Bytecode) -> Pending<Reply> {
        tracing::debug!(len = bytecode.len(), expected_reply_length, "queueing command");
        let (resolver, pending) = Pending::channel();

        // On failure the request, and with it the resolver, is dropped,
        // so the handle resolves as disconnected.
        let _ = self.enqueue(Request::Reply {
            expected_reply_length,
            bytecode,
            resolver,
        });
        pending
    }

    fn enqueue(&self, request: Request) -> Result<(), ChannelError> {
        self.queue
            .as_ref()
            .ok_or(ChannelError::Disconnected)?
            .send(request)
            .map_err(|_| ChannelError::Disconnected)
    }
}

impl Drop for AsyncChannel {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop once it is drained
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("spooler thread panicked");
            }
        }
    }
}

/// The worker loop. Runs until every sender is gone.
fn spool<C: Channel>(mut channel: C, mut rx: mpsc::UnboundedReceiver<Request>) {
    while let Some(request) = rx.blocking_recv() {
        match request {
            Request::NoReply(bytecode) => {
                if let Err(e) = channel.send_no_reply(&bytecode) {
                    tracing::warn!(error = %e, "command without reply failed");
                }
            }
            Request::Reply {
                expected_reply_length,
                bytecode,
                resolver,
            } => {
                let result = channel
                    .send(expected_reply_length, &bytecode)
                    .map(Reply::new)
                    .map_err(Into::into);
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "command failed");
                }
                // The caller may have dropped its handle, that is fine.
                let _ = resolver.send(result);
            }
        }
    }
    tracing::debug!("spooler queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays canned results and records what was sent.
    struct Scripted {
        replies: VecDeque<Result<Vec<u8>, ChannelError>>,
        sent: Arc<parking_lot::Mutex<Vec<Vec<u8>>>>,
    }

    impl Channel for Scripted {
        fn send_no_reply(&mut self, bytecode: &Bytecode) -> Result<(), ChannelError> {
            self.sent.lock().push(bytecode.as_bytes().to_vec());
            Ok(())
        }

        fn send(&mut self, _: u16, bytecode: &Bytecode) -> Result<Vec<u8>, ChannelError> {
            self.sent.lock().push(bytecode.as_bytes().to_vec());
            self.replies.pop_front().unwrap_or(Err(ChannelError::CommandFailed))
        }
    }

    fn op(code: u8) -> Bytecode {
        let mut bc = Bytecode::new();
        bc.add_op_code(code);
        bc
    }

    #[test]
    fn replies_resolve_in_order() {
        let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let channel = AsyncChannel::new(Scripted {
            replies: VecDeque::from(vec![Ok(vec![1]), Ok(vec![2])]),
            sent: sent.clone(),
        })
        .unwrap();

        let first = channel.send(0, op(0xA));
        channel.send_no_reply(op(0xB)).unwrap();
        let second = channel.send(0, op(0xC));

        assert_eq!(first.wait().unwrap().data(), &[1]);
        assert_eq!(second.wait().unwrap().data(), &[2]);
        assert_eq!(*sent.lock(), vec![vec![0xA], vec![0xB], vec![0xC]]);
    }

    #[test]
    fn failure_only_affects_its_own_request() {
        let channel = AsyncChannel::new(Scripted {
            replies: VecDeque::from(vec![
                Err(ChannelError::IoError(std::io::ErrorKind::TimedOut.into())),
                Ok(vec![9]),
            ]),
            sent: Default::default(),
        })
        .unwrap();

        let failed = channel.send(1, op(0x1));
        let ok = channel.send(1, op(0x2));

        assert!(matches!(
            failed.wait(),
            Err(Error::Channel(ChannelError::IoError(_)))
        ));
        assert_eq!(ok.wait().unwrap().data(), &[9]);
    }

    #[test]
    fn drop_drains_the_queue() {
        let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let channel = AsyncChannel::new(Scripted {
            replies: VecDeque::new(),
            sent: sent.clone(),
        })
        .unwrap();

        for code in 0..5u8 {
            channel.send_no_reply(op(code)).unwrap();
        }
        drop(channel);

        assert_eq!(sent.lock().len(), 5);
    }
}
