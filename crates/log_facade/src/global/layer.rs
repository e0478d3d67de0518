//! Bridges `tracing` events to whichever logger is installed in a [`GlobalLogger`].

use tracing::{Event, Metadata, Subscriber, subscriber::Interest};
use tracing_subscriber::{Layer, layer::Context};

use super::GlobalLogger;

/// A [`tracing_subscriber::Layer`] that forwards every event to the logger currently installed
/// in a [`GlobalLogger`].
///
/// The installed logger is looked up per event, so re-initializing the global logger takes
/// effect for code that logs through the [`tracing`] macros without rebuilding the subscriber.
///
/// ```
/// use log_facade::global;
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let subscriber = tracing_subscriber::registry().with(global::layer());
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!(port = 8080, "listening");
/// });
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GlobalLayer {
    target: &'static GlobalLogger,
}

impl GlobalLayer {
    /// Creates a layer forwarding to `target`.
    pub fn new(target: &'static GlobalLogger) -> Self {
        Self { target }
    }
}

impl<S> Layer<S> for GlobalLayer
where
    S: Subscriber,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The installed logger, and with it the threshold, can change at any time.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.target
            .current
            .load()
            .handler()
            .enabled_for_metadata(metadata)
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.target.current.load().handler().handle_event(event);
    }
}
