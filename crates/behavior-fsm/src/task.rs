//! Suspendable lifecycle work.
//!
//! Entry and exit hooks return a [`LifecycleTask`]: a boxed future the driver
//! polls exactly once per frame. A task that is ready on its first poll
//! completes within the tick that started the transition; a task that
//! yields keeps the driver in an in-flight phase until it resolves.
//!
//! Tasks are `'static`. Anything they touch across frames (navigation,
//! animation, shared counters) has to be cloned in before the hook returns.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::HookResult;

pub type LifecycleTask = BoxFuture<'static, HookResult>;

/// A task that is already complete.
pub fn finished() -> LifecycleTask {
    futures::future::ready(Ok(())).boxed()
}

/// Polls `task` once with a no-op waker.
///
/// Returns `None` while it is still pending.
pub fn poll_once(task: &mut LifecycleTask) -> Option<HookResult> {
    task.as_mut().now_or_never()
}

/// Suspends for `frames` driver ticks.
pub fn yield_frames(frames: u32) -> YieldFrames {
    YieldFrames { remaining: frames }
}

/// Resolves on the first poll where `condition` holds.
pub fn wait_until<F>(condition: F) -> WaitUntil<F>
where
    F: FnMut() -> bool + Send + Unpin,
{
    WaitUntil { condition }
}

#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct YieldFrames {
    remaining: u32,
}

impl Future for YieldFrames {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[must_use = "futures do nothing unless polled"]
pub struct WaitUntil<F> {
    condition: F,
}

impl<F> Future for WaitUntil<F>
where
    F: FnMut() -> bool + Unpin,
{
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if (self.condition)() {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
