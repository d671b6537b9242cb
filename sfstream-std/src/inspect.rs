//! Logging stage for event observation.

use sfstream_core::{EventResult, EventStream, StreamFilter};

/// A pass-through stage that logs every event and error it forwards.
///
/// Without the `tracing` feature it forwards the stream untouched.
#[derive(Debug, Clone)]
pub struct LoggingStage {
    name: &'static str,
}

impl LoggingStage {
    /// A stage whose log records carry `name`.
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for LoggingStage {
    fn default() -> Self {
        Self::new("events")
    }
}

fn observe(name: &'static str, item: &EventResult) {
    #[cfg(feature = "tracing")]
    {
        match item {
            Ok(event) => tracing::debug!(stage = name, ?event, "event"),
            Err(error) => tracing::debug!(stage = name, %error, "stream error"),
        }
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = (name, item);
    }
}

impl<'a> StreamFilter<'a> for LoggingStage {
    fn apply(self, stream: EventStream<'a>) -> EventStream<'a> {
        let name = self.name;
        Box::new(stream.inspect(move |item| observe(name, item)))
    }
}
