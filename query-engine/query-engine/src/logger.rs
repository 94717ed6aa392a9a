use crate::{error::EngineError, EngineResult, LogFormat};
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// The crates `QE_LOG_LEVEL` applies to.
const ENGINE_CRATES: &[&str] = &["query_engine", "query_core", "sql_query_connector"];

/// An installer for a global logger. Logs go to stderr, stdout is reserved
/// for responses.
#[derive(Debug, Clone)]
pub struct Logger {
    service_name: &'static str,
    log_format: LogFormat,
    log_queries: bool,
}

impl Logger {
    /// Initialize a new global logger installer.
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            log_format: LogFormat::Text,
            log_queries: false,
        }
    }

    /// Sets the log output format. Default: Text.
    pub fn log_format(&mut self, log_format: LogFormat) {
        self.log_format = log_format;
    }

    /// Enable statement logging. Default: false.
    pub fn log_queries(&mut self, log_queries: bool) {
        self.log_queries = log_queries;
    }

    /// Install logger as a global. Can be called only once per application
    /// instance.
    pub fn install(&self) -> EngineResult<()> {
        let filter = create_env_filter(self.log_queries, std::env::var("QE_LOG_LEVEL").ok().as_deref())?;

        let fmt_layer = match self.log_format {
            LogFormat::Text => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(fmt_layer);

        subscriber::set_global_default(subscriber).map_err(|err| EngineError::LoggerError(err.to_string()))?;
        debug!(service = self.service_name, format = %self.log_format, "logger installed");

        Ok(())
    }
}

/// `RUST_LOG` directives, raised for the engine's crates by `QE_LOG_LEVEL`.
pub(crate) fn create_env_filter(log_queries: bool, qe_log_level: Option<&str>) -> EngineResult<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();

    if let Some(level) = qe_log_level {
        for krate in ENGINE_CRATES {
            filter = filter.add_directive(directive(&format!("{krate}={level}"))?);
        }
    }

    if log_queries {
        filter = filter.add_directive(directive("sql_query_connector::stats=debug")?);
    }

    Ok(filter)
}

fn directive(text: &str) -> EngineResult<tracing_subscriber::filter::Directive> {
    text.parse()
        .map_err(|err| EngineError::LoggerError(format!("invalid log directive '{text}': {err}")))
}
