//! A result that will be available later.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::errors::{ChannelError, Error};

/// Write-once slot filled by a worker thread.
///
/// Blocking callers use [Pending::wait], async callers `.await` it.
/// If the worker drops the slot without filling it the result is
/// [ChannelError::Disconnected].
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, Error>>,
}

/// The producing half of a [Pending].
pub(crate) type Resolver<T> = oneshot::Sender<Result<T, Error>>;

impl<T> Pending<T> {
    pub(crate) fn channel() -> (Resolver<T>, Pending<T>) {
        let (tx, rx) = oneshot::channel();
        (tx, Pending { rx })
    }

    /// A handle that is already resolved.
    pub fn ready(result: Result<T, Error>) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(result);
        pending
    }

    /// Blocks the current thread until the result is available.
    ///
    /// # Panics
    /// Panics when called from inside an async runtime. Use `.await` there.
    pub fn wait(self) -> Result<T, Error> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(ChannelError::Disconnected.into()))
    }

    /// Returns the result if it is already available, or gives the handle back.
    pub fn try_take(mut self) -> Result<Result<T, Error>, Self> {
        match self.rx.try_recv() {
            Ok(result) => Ok(result),
            Err(oneshot::error::TryRecvError::Empty) => Err(self),
            Err(oneshot::error::TryRecvError::Closed) => Ok(Err(ChannelError::Disconnected.into())),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(ChannelError::Disconnected.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_resolves_immediately() {
        assert_eq!(Pending::ready(Ok(7)).wait().unwrap(), 7);
    }

    #[test]
    fn dropped_resolver_is_disconnected() {
        let (tx, pending) = Pending::<u8>::channel();
        drop(tx);
        assert!(matches!(
            pending.wait(),
            Err(Error::Channel(ChannelError::Disconnected))
        ));
    }

    #[test]
    fn try_take_hands_back_unresolved() {
        let (tx, pending) = Pending::<u8>::channel();
        let pending = pending.try_take().expect_err("nothing sent yet");
        tx.send(Ok(3)).unwrap();
        assert_eq!(pending.try_take().unwrap().unwrap(), 3);
    }

    #[tokio::test]
    async fn can_be_awaited() {
        let (tx, pending) = Pending::<&'static str>::channel();
        std::thread::spawn(move || {
            let _ = tx.send(Ok("done"));
        });
        assert_eq!(pending.await.unwrap(), "done");
    }
}
