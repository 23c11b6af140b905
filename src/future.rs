use std::{
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
    time::Instant,
};

pub(crate) trait Timed: Future + Sized {
    /// Record how long this future took under `name`, labelled by whether it succeeded
    fn timed(self, name: &'static str) -> TimedFuture<Self> {
        TimedFuture {
            future: self,
            name,
            start: Instant::now(),
        }
    }
}

impl<F> Timed for F where F: Future {}

pin_project_lite::pin_project! {
    pub(crate) struct TimedFuture<F> {
        #[pin]
        future: F,

        name: &'static str,
        start: Instant,
    }
}

impl<F, T, E> Future for TimedFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let out = ready!(this.future.poll(cx));

        let outcome = if out.is_ok() { "success" } else { "failure" };

        metrics::histogram!(*this.name, "outcome" => outcome)
            .record(this.start.elapsed().as_secs_f64());

        Poll::Ready(out)
    }
}
