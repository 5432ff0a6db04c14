//! Shared test utilities used across clustrum crates.

pub mod tracing {
    //! Recording layer utilities for capturing spans and events in tests.
    use std::{
        collections::HashMap,
        fmt,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
    };

    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
        span::{Attributes, Id, Record},
        subscriber::DefaultGuard,
    };
    use tracing_subscriber::{
        Layer, Registry,
        layer::{Context, SubscriberExt},
        registry::LookupSpan,
    };

    /// Recording layer installed during tests to capture closed spans and
    /// emitted events for later assertions.
    ///
    /// Clones share one journal, so a clone handed to the subscriber and the
    /// original kept by the test observe the same records.
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        journal: Arc<Mutex<Journal>>,
    }

    #[derive(Default)]
    struct Journal {
        spans: Vec<SpanRecord>,
        events: Vec<EventRecord>,
    }

    impl RecordingLayer {
        /// Installs a fresh layer as the thread-default subscriber.
        ///
        /// Recording stops when the returned guard is dropped.
        ///
        /// # Examples
        /// ```
        /// use clustrum_test_support::tracing::RecordingLayer;
        ///
        /// let (layer, guard) = RecordingLayer::install();
        /// tracing::info!(purity = 1.0, "scored");
        /// drop(guard);
        /// assert_eq!(layer.events_with_message("scored").len(), 1);
        /// ```
        #[must_use]
        pub fn install() -> (Self, DefaultGuard) {
            let layer = Self::default();
            let subscriber = Registry::default().with(layer.clone());
            let guard = tracing::subscriber::set_default(subscriber);
            (layer, guard)
        }

        /// Returns a snapshot of the closed spans in completion order.
        ///
        /// # Examples
        /// ```
        /// use clustrum_test_support::tracing::RecordingLayer;
        ///
        /// let layer = RecordingLayer::default();
        /// assert!(layer.spans().is_empty());
        /// ```
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.journal().spans.clone()
        }

        /// Returns a snapshot of the emitted events in emission order.
        ///
        /// # Examples
        /// ```
        /// use clustrum_test_support::tracing::RecordingLayer;
        ///
        /// let layer = RecordingLayer::default();
        /// assert!(layer.events().is_empty());
        /// ```
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.journal().events.clone()
        }

        /// Returns the most recently closed span called `name`.
        #[must_use]
        pub fn last_span(&self, name: &str) -> Option<SpanRecord> {
            self.journal()
                .spans
                .iter()
                .rev()
                .find(|span| span.name == name)
                .cloned()
        }

        /// Returns every event whose `message` field equals `message`.
        #[must_use]
        pub fn events_with_message(&self, message: &str) -> Vec<EventRecord> {
            self.journal()
                .events
                .iter()
                .filter(|event| event.message() == Some(message))
                .cloned()
                .collect()
        }

        fn journal(&self) -> MutexGuard<'_, Journal> {
            self.journal.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Snapshot of a closed span and the fields recorded against it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name captured from the tracing metadata.
        pub name: String,
        /// Structured fields recorded against the span.
        pub fields: HashMap<String, String>,
    }

    impl SpanRecord {
        /// Returns the rendered value of `field`, if recorded.
        #[must_use]
        pub fn field(&self, field: &str) -> Option<&str> {
            self.fields.get(field).map(String::as_str)
        }
    }

    /// Snapshot of an emitted tracing event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Log level associated with the recorded event.
        pub level: Level,
        /// Event target string extracted from the metadata.
        pub target: String,
        /// Structured fields attached to the event, including `message`.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Returns the rendered value of `field`, if recorded.
        #[must_use]
        pub fn field(&self, field: &str) -> Option<&str> {
            self.fields.get(field).map(String::as_str)
        }

        /// Returns the event's formatted message.
        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.field("message")
        }
    }

    struct PendingSpan {
        name: &'static str,
        fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut pending = PendingSpan {
                name: attrs.metadata().name(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldRecorder(&mut pending.fields));
            span.extensions_mut().insert(pending);
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(pending) = span.extensions_mut().get_mut::<PendingSpan>() {
                values.record(&mut FieldRecorder(&mut pending.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(pending) = span.extensions_mut().remove::<PendingSpan>() else {
                return;
            };
            self.journal().spans.push(SpanRecord {
                name: pending.name.to_owned(),
                fields: pending.fields,
            });
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldRecorder(&mut fields));
            self.journal().events.push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

    impl FieldRecorder<'_> {
        fn put(&mut self, field: &Field, value: String) {
            self.0.insert(field.name().to_owned(), value);
        }
    }

    impl Visit for FieldRecorder<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.put(field, format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.put(field, value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.put(field, value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.put(field, value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.put(field, value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.put(field, value.to_string());
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            self.put(field, value.to_string());
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use rstest::rstest;

        #[rstest]
        fn records_span_fields_after_close() {
            let (layer, guard) = RecordingLayer::install();
            {
                let span = tracing::info_span!("core.validate", records = 3_u64, dataset = "train");
                let _entered = span.enter();
            }
            drop(guard);

            let span = layer.last_span("core.validate").expect("span must be recorded");
            assert_eq!(span.field("records"), Some("3"));
            assert_eq!(span.field("dataset"), Some("train"));
        }

        #[rstest]
        fn late_recorded_fields_are_captured() {
            let (layer, guard) = RecordingLayer::install();
            {
                let span = tracing::info_span!("late", purity = tracing::field::Empty);
                span.record("purity", 0.5_f64);
            }
            drop(guard);

            let span = layer.last_span("late").expect("span must be recorded");
            assert_eq!(span.field("purity"), Some("0.5"));
        }

        #[rstest]
        #[case(Level::INFO)]
        #[case(Level::WARN)]
        fn events_keep_level_and_message(#[case] level: Level) {
            let (layer, guard) = RecordingLayer::install();
            if level == Level::WARN {
                tracing::warn!(shards = 4_u64, "counted");
            } else {
                tracing::info!(shards = 4_u64, "counted");
            }
            drop(guard);

            let events = layer.events_with_message("counted");
            assert_eq!(events.len(), 1);
            let event = events.first().expect("event must be recorded");
            assert_eq!(event.level, level);
            assert_eq!(event.field("shards"), Some("4"));
        }
    }
}

pub mod ci;
