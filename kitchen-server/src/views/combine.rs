//! Combine-latest stream operator
//!
//! Remembers the latest item of each input and emits `f(left, right)`
//! whenever either side produces a new item, once both sides have produced
//! at least one.
//!
//! ```text
//! left:   a ───────── b ─────────────
//! right:  ──── 1 ──────────── 2 ─────
//! output: ──── f(a,1) ─ f(b,1) ─ f(b,2)
//! ```
//!
//! The output ends when both inputs have ended, or as soon as one input ends
//! without ever producing an item (no combination can be formed anymore).

use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream returned by [`combine_latest`]
pub struct CombineLatest<L: Stream, R: Stream, F> {
    left: Option<L>,
    right: Option<R>,
    left_value: Option<L::Item>,
    right_value: Option<R::Item>,
    combine: F,
}

// Items and the combiner are never pinned; only the inputs are polled.
impl<L: Stream + Unpin, R: Stream + Unpin, F> Unpin for CombineLatest<L, R, F> {}

/// Combine two streams, re-emitting on every update of either side
pub fn combine_latest<L, R, F, T>(left: L, right: R, combine: F) -> CombineLatest<L, R, F>
where
    L: Stream + Unpin,
    R: Stream + Unpin,
    F: FnMut(&L::Item, &R::Item) -> T,
{
    CombineLatest {
        left: Some(left),
        right: Some(right),
        left_value: None,
        right_value: None,
        combine,
    }
}

/// Poll one input once; `true` when it produced a new item
fn poll_side<S: Stream + Unpin>(
    stream: &mut Option<S>,
    latest: &mut Option<S::Item>,
    cx: &mut Context<'_>,
) -> bool {
    let Some(inner) = stream.as_mut() else {
        return false;
    };
    match inner.poll_next_unpin(cx) {
        Poll::Ready(Some(item)) => {
            *latest = Some(item);
            true
        }
        Poll::Ready(None) => {
            *stream = None;
            false
        }
        Poll::Pending => false,
    }
}

impl<L, R, F, T> Stream for CombineLatest<L, R, F>
where
    L: Stream + Unpin,
    R: Stream + Unpin,
    F: FnMut(&L::Item, &R::Item) -> T,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();

        let left_changed = poll_side(&mut this.left, &mut this.left_value, cx);
        let right_changed = poll_side(&mut this.right, &mut this.right_value, cx);
        let changed = left_changed || right_changed;

        if changed && let (Some(l), Some(r)) = (&this.left_value, &this.right_value) {
            return Poll::Ready(Some((this.combine)(l, r)));
        }

        let left_dead = this.left.is_none() && (this.right.is_none() || this.left_value.is_none());
        let right_dead = this.right.is_none() && this.right_value.is_none();
        if left_dead || right_dead {
            return Poll::Ready(None);
        }

        if changed {
            // One side moved but the other has nothing yet; the side that
            // returned Ready registered no waker, so poll again.
            cx.waker().wake_by_ref();
        }
        Poll::Pending
    }
}
