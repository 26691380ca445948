//! Initializes the process-wide `tracing` subscriber and bridges the `log`
//! facade (used by `tokio-postgres`, `hyper`, etc.) into it.
//!
//! When configured with a log file, supports reopening it on SIGHUP so an
//! external log-rotation tool can `mv` the file out from under the process
//! without losing subsequent writes.

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use super::config::DatadogConfig;

#[derive(Clone)]
struct ReopenableFile {
	path: String,
	file: Arc<Mutex<File>>,
}

impl ReopenableFile {
	fn open(path: &str) -> io::Result<Self> {
		let file = OpenOptions::new().create(true).append(true).open(path)?;
		Ok(Self { path: path.to_string(), file: Arc::new(Mutex::new(file)) })
	}

	fn reopen(&self) -> io::Result<()> {
		let new_file = OpenOptions::new().create(true).append(true).open(&self.path)?;
		*self.file.lock().unwrap_or_else(|e| e.into_inner()) = new_file;
		Ok(())
	}
}

impl io::Write for ReopenableFile {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.file.lock().unwrap_or_else(|e| e.into_inner()).write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.file.lock().unwrap_or_else(|e| e.into_inner()).flush()
	}
}

impl<'a> MakeWriter<'a> for ReopenableFile {
	type Writer = ReopenableFile;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

/// Owns the logging sink and supports SIGHUP-triggered reopening.
pub(crate) struct ServerLogger {
	file: Option<ReopenableFile>,
}

impl ServerLogger {
	/// Initializes the global `tracing` subscriber, writing to `log_file`
	/// (if given) or stdout otherwise, and bridges `log` records through
	/// `tracing-log` so dependencies that still use the `log` facade are
	/// captured too.
	///
	/// `datadog_config` only controls whether spans carry the
	/// `span.type`/`resource.name` fields APM agents key on (see
	/// `vss_service`'s instrumentation) -- actually exporting them to an
	/// Agent is left to a `tracing-datadog` layer in deployments that need
	/// it.
	pub(crate) fn init(
		log_file: Option<&str>, datadog_config: Option<&DatadogConfig>,
	) -> Result<Self, Box<dyn std::error::Error>> {
		tracing_log::LogTracer::init()?;

		let env_filter =
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

		let file = log_file.map(ReopenableFile::open).transpose()?;

		let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match &file {
			Some(f) => Box::new(tracing_subscriber::fmt::layer().with_writer(f.clone())),
			None => Box::new(tracing_subscriber::fmt::layer()),
		};

		if let Some(dd) = datadog_config.filter(|c| c.is_enabled()) {
			log::info!(
				"Datadog APM enabled for service `{}` (agent {}:{})",
				dd.get_service(),
				dd.get_agent_host(),
				dd.get_agent_port()
			);
		}

		let subscriber = Registry::default().with(env_filter).with(fmt_layer);
		subscriber.try_init()?;

		Ok(Self { file })
	}

	/// Reopens the log file in place, for use by a SIGHUP handler after an
	/// external log rotation.
	pub(crate) fn reopen(&self) -> io::Result<()> {
		match &self.file {
			Some(f) => f.reopen(),
			None => Ok(()),
		}
	}
}
