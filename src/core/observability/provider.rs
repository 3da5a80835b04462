use crate::app::config::{FileRotation, LogType, LoggingConfig, OtelProto};
use anyhow::{Context, Result, anyhow};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::fmt::format::{FmtSpan, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

type DynLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Export pipelines which must be flushed on shutdown
pub struct Telemetry {
    pub tracer: SdkTracerProvider,
    pub meter: Option<SdkMeterProvider>,
}

struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber described by `config`. Returns the
/// otel providers when an otel sink is configured.
pub fn init(config: &LoggingConfig) -> Result<Option<Telemetry>> {
    config.validate()?;

    let crate_name = env!("CARGO_PKG_NAME");
    let filter = EnvFilter::from_default_env()
        .add_directive("error".parse()?)
        .add_directive(format!("{}={}", crate_name, config.level).parse()?);

    let mut layers: Vec<DynLayer> = Vec::new();
    let mut telemetry: Option<Telemetry> = None;

    for sink in &config.sinks {
        match &sink.dest {
            LogType::Stdout { color, json } => {
                let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
                // flushes on drop, the writer must live as long as the process
                std::mem::forget(guard);

                layers.push(fmt_layer(writer, *json, *color, sink.spans));
            }
            LogType::File {
                path,
                json,
                rotation,
                max_files,
            } => {
                let writer = create_file_writer(path, rotation, *max_files)?;

                layers.push(fmt_layer(writer, *json, false, sink.spans));
            }
            LogType::Otel {
                endpoint,
                proto,
                metrics,
                metrics_interval,
            } => {
                let resource = resource();
                let (layer, tracer) =
                    create_otel_layer(endpoint, proto, config.span_sample_rate, resource.clone())?;

                let meter = match metrics {
                    true => Some(create_meter_provider(
                        endpoint,
                        proto,
                        *metrics_interval,
                        resource,
                    )?),
                    false => None,
                };

                layers.push(layer);
                telemetry = Some(Telemetry { tracer, meter });
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    if let Some(telemetry) = &telemetry {
        global::set_text_map_propagator(TraceContextPropagator::new());
        let _ = global::set_tracer_provider(telemetry.tracer.clone());

        if let Some(meter) = &telemetry.meter {
            global::set_meter_provider(meter.clone());
        }
    }

    Ok(telemetry)
}

pub fn shutdown(telemetry: &Telemetry) -> Result<()> {
    if let Some(meter) = &telemetry.meter {
        meter
            .shutdown()
            .context("failed to shutdown meter provider")?;
    }

    telemetry
        .tracer
        .shutdown()
        .context("failed to shutdown tracer provider")
}

fn fmt_layer<W>(writer: W, json: bool, color: bool, spans: bool) -> DynLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let span_events = match spans {
        true => FmtSpan::NEW | FmtSpan::CLOSE,
        false => FmtSpan::NONE,
    };

    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(span_events)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_timer(CompactTime)
            .with_ansi(color)
            .with_writer(writer)
            .with_span_events(span_events)
            .boxed()
    }
}

fn create_file_writer(
    path: &Path,
    rotation: &FileRotation,
    max_files: usize,
) -> Result<tracing_appender::non_blocking::NonBlocking> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name in path: {}", path.display()))?;

    let directory = path
        .parent()
        .ok_or_else(|| anyhow!("Invalid directory in path: {}", path.display()))?;

    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    }

    let rotation = match rotation {
        FileRotation::Daily => tracing_appender::rolling::Rotation::DAILY,
        FileRotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
        FileRotation::Never => tracing_appender::rolling::Rotation::NEVER,
    };

    let mut appender = tracing_appender::rolling::Builder::new()
        .rotation(rotation)
        .filename_prefix(file_name);

    if max_files > 0 {
        appender = appender.max_log_files(max_files);
    }

    let appender = appender
        .build(directory)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    std::mem::forget(guard);

    Ok(writer)
}

fn resource() -> Resource {
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string());

    Resource::builder()
        .with_service_name(service_name)
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build()
}

fn create_otel_layer(
    endpoint: &str,
    proto: &OtelProto,
    sample_rate: f32,
    resource: Resource,
) -> Result<(DynLayer, SdkTracerProvider)> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = match proto {
        OtelProto::Grpc => {
            let mut builder = opentelemetry_otlp::SpanExporter::builder().with_tonic();
            if !endpoint.is_empty() {
                builder = builder.with_endpoint(endpoint);
            }

            builder
                .build()
                .context("failed to build OTLP gRPC span exporter")?
        }
        OtelProto::Http => build_http_span_exporter(endpoint)?,
    };

    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(sample_rate as f64)));

    let provider = SdkTracerProvider::builder()
        .with_sampler(sampler)
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();

    Ok((layer, provider))
}

fn create_meter_provider(
    endpoint: &str,
    proto: &OtelProto,
    interval: Duration,
    resource: Resource,
) -> Result<SdkMeterProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = match proto {
        OtelProto::Grpc => {
            let mut builder = opentelemetry_otlp::MetricExporter::builder().with_tonic();
            if !endpoint.is_empty() {
                builder = builder.with_endpoint(endpoint);
            }

            builder
                .build()
                .context("failed to build OTLP gRPC metric exporter")?
        }
        OtelProto::Http => build_http_metric_exporter(endpoint)?,
    };

    let reader = PeriodicReader::builder(exporter)
        .with_interval(interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

#[cfg(feature = "otel-http")]
fn build_http_span_exporter(endpoint: &str) -> Result<opentelemetry_otlp::SpanExporter> {
    use opentelemetry_otlp::WithExportConfig;

    let mut builder = opentelemetry_otlp::SpanExporter::builder().with_http();
    if !endpoint.is_empty() {
        builder = builder.with_endpoint(endpoint);
    }

    builder
        .build()
        .context("failed to build OTLP HTTP span exporter")
}

#[cfg(feature = "otel-http")]
fn build_http_metric_exporter(endpoint: &str) -> Result<opentelemetry_otlp::MetricExporter> {
    use opentelemetry_otlp::WithExportConfig;

    let mut builder = opentelemetry_otlp::MetricExporter::builder().with_http();
    if !endpoint.is_empty() {
        builder = builder.with_endpoint(endpoint);
    }

    builder
        .build()
        .context("failed to build OTLP HTTP metric exporter")
}

#[cfg(not(feature = "otel-http"))]
fn build_http_span_exporter(_: &str) -> Result<opentelemetry_otlp::SpanExporter> {
    Err(anyhow!(
        "OTLP HTTP exporter requested but the build does not enable the `otel-http` feature"
    ))
}

#[cfg(not(feature = "otel-http"))]
fn build_http_metric_exporter(_: &str) -> Result<opentelemetry_otlp::MetricExporter> {
    Err(anyhow!(
        "OTLP HTTP exporter requested but the build does not enable the `otel-http` feature"
    ))
}
