/// Opens the root span of an auction request, sampled up front.
///
/// Sampling happens before the span is built so that unsampled requests
/// pay nothing for span construction or context propagation. When a
/// parent span is already active the new span always attaches to it,
/// keeping sampled traces complete.
///
/// # Arguments
/// * `sample_percent` - Fraction (0.0 to 1.0) of root spans to keep
/// * `span_name` - Span name, must be a literal
///
/// # Returns
/// The new span, or `Span::none()` when there is no parent and the
/// request was not sampled
///
/// # Example
/// ```ignore
/// let span = sample_or_attach_root_span!(0.05, "auction_pipeline");
/// pipeline.run(&ctx).instrument(span).await
/// ```
#[macro_export]
macro_rules! sample_or_attach_root_span {
    ($sample_percent:expr, $span_name:literal) => {{
        let current = ::tracing::Span::current();

        if !current.is_disabled() || ::rand::random::<f32>() < $sample_percent {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// INFO child span, built only when the current span is sampled.
///
/// Returns an un-entered span; use `.instrument()` for futures.
/// Fields follow the `tracing` span syntax, declare
/// `field = tracing::field::Empty` to `record` it later.
///
/// ```ignore
/// let span = child_span_info!("partner_solicitation", dsp_id = %partner.dsp_id);
/// ```
#[macro_export]
macro_rules! child_span_info {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// DEBUG counterpart of [`child_span_info!`]
#[macro_export]
macro_rules! child_span_debug {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_child_span_is_none_without_sampled_parent() {
        let span = child_span_info!("orphan", key = 1);
        assert!(span.is_disabled());

        let span = child_span_debug!("orphan");
        assert!(span.is_disabled());
    }

    #[test]
    fn test_root_span_never_sampled_at_zero() {
        for _ in 0..32 {
            let span = sample_or_attach_root_span!(0.0, "never");
            assert!(span.is_disabled());
        }
    }
}
