//! Hosts VSS http-server implementation.
//!
//! VSS is an open-source project designed to offer a server-side cloud storage solution specifically
//! tailored for noncustodial Lightning supporting mobile wallets. Its primary objective is to
//! simplify the development process for Lightning wallets by providing a secure means to store
//! and manage the essential state required for Lightning Network (LN) operations.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::unix::SignalKind;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;

use log::{error, info, warn};

use api::auth::Authorizer;
#[cfg(noop_authorizer)]
use api::auth::NoopAuthorizer;
use api::kv_store::KvStore;
#[cfg(feature = "jwt")]
use auth_impls::jwt::JWTAuthorizer;
#[cfg(feature = "sigs")]
use auth_impls::signature::SignatureValidatingAuthorizer;
use impls::postgres_store::{PostgresPlaintextBackend, PostgresTlsBackend};
use util::config::Config;
use util::logger::ServerLogger;
use vss_service::VssService;

mod util;
mod vss_service;

fn main() {
	let args: Vec<String> = std::env::args().collect();
	if args.len() != 2 {
		eprintln!("Usage: {} <config-file-path>", args[0]);
		std::process::exit(1);
	}

	let config = match util::config::load_config(&args[1]) {
		Ok(cfg) => cfg,
		Err(e) => {
			eprintln!("Failed to load configuration: {}", e);
			std::process::exit(1);
		},
	};

	let logger =
		match ServerLogger::init(config.log_file.as_deref(), config.datadog_config.as_ref()) {
			Ok(logger) => logger,
			Err(e) => {
				eprintln!("Failed to initialize logger: {e}");
				std::process::exit(1);
			},
		};

	// Initialize Sentry before the tokio runtime to ensure proper Hub inheritance
	// for spawned threads. The guard must be kept alive for the duration of the program.
	let _sentry_guard = initialize_sentry(&config.sentry_config);

	let Config { server_config, jwt_auth_config, postgresql_config, .. } = config;

	let addr: SocketAddr = match format!("{}:{}", server_config.host, server_config.port).parse() {
		Ok(addr) => addr,
		Err(e) => {
			error!("Failed to parse bind address: {e}");
			std::process::exit(1);
		},
	};

	let postgresql_config = postgresql_config.unwrap_or_else(|| {
		error!("Missing required [postgresql_config] section in configuration.");
		std::process::exit(1);
	});

	let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
		Ok(runtime) => Arc::new(runtime),
		Err(e) => {
			error!("Failed to setup tokio runtime: {}", e);
			std::process::exit(1);
		},
	};

	runtime.block_on(async {
		// Register SIGHUP handler for log rotation
		let mut sighup_stream = match tokio::signal::unix::signal(SignalKind::hangup()) {
			Ok(stream) => stream,
			Err(e) => {
				error!("Failed to register SIGHUP handler: {e}");
				std::process::exit(1);
			},
		};

		let mut sigterm_stream = match tokio::signal::unix::signal(SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(e) => {
				error!("Failed to register for SIGTERM stream: {}", e);
				std::process::exit(1);
			},
		};

		let mut authorizer: Option<Arc<dyn Authorizer>> = None;
		#[cfg(feature = "jwt")]
		{
			if let Some(jwt_auth_config) = jwt_auth_config {
				authorizer = match JWTAuthorizer::new(&jwt_auth_config.rsa_pem).await {
					Ok(auth) => {
						info!("Configured JWT authorizer with RSA public key");
						Some(Arc::new(auth))
					},
					Err(e) => {
						error!("Failed to configure JWT authorizer: {}", e);
						std::process::exit(1);
					},
				};
			}
		}
		#[cfg(feature = "sigs")]
		{
			if authorizer.is_none() {
				info!("Configured signature-validating authorizer");
				authorizer = Some(Arc::new(SignatureValidatingAuthorizer));
			}
		}

		#[cfg(noop_authorizer)]
		let authorizer = if let Some(auth) = authorizer {
			auth
		} else {
			warn!("No authentication method configured, all storage with the same store id will be commingled.");
			Arc::new(NoopAuthorizer {})
		};

		#[cfg(not(noop_authorizer))]
		let authorizer = authorizer.unwrap_or_else(||  {
			error!("No authentication method configured, please configure either `JWTAuthorizer` or `SignatureValidatingAuthorizer`");
			std::process::exit(1);
		});

		let postgresql_prefix = postgresql_config.to_postgresql_prefix();
		let pool_config = postgresql_config.pool.clone().map(Into::into).unwrap_or_default();

		let store: Arc<dyn KvStore> = if let Some(tls_config) = &postgresql_config.tls {
			let ca_pem = tls_config.read_ca_pem().unwrap_or_else(|e| {
				error!("Failed to read PostgreSQL CA certificate: {}", e);
				std::process::exit(1);
			});
			let postgres_tls_backend = PostgresTlsBackend::new_with_pool_config(
				&postgresql_prefix,
				postgresql_config.default_db(),
				&postgresql_config.database,
				ca_pem.as_deref(),
				pool_config,
			)
			.await
			.unwrap_or_else(|e| {
				error!("Failed to start postgres TLS backend: {}", e);
				std::process::exit(1);
			});
			info!(
				"Connected to PostgreSQL TLS backend (db: {})",
				postgresql_config.database
			);
			Arc::new(postgres_tls_backend)
		} else {
			let postgres_plaintext_backend = PostgresPlaintextBackend::new_with_pool_config(
				&postgresql_prefix,
				postgresql_config.default_db(),
				&postgresql_config.database,
				pool_config,
			)
			.await
			.unwrap_or_else(|e| {
				error!("Failed to start postgres plaintext backend: {}", e);
				std::process::exit(1);
			});
			info!(
				"Connected to PostgreSQL plaintext backend (db: {})",
				postgresql_config.database
			);
			Arc::new(postgres_plaintext_backend)
		};

		let rest_svc_listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
			error!("Failed to bind listening port: {}", e);
			std::process::exit(1);
		});
		info!("Listening for incoming connections on {}{}", addr, crate::vss_service::BASE_PATH_PREFIX);

		loop {
			tokio::select! {
				res = rest_svc_listener.accept() => {
					match res {
						Ok((stream, _)) => {
							let io_stream = TokioIo::new(stream);
							let vss_service = VssService::new(Arc::clone(&store), Arc::clone(&authorizer));
							runtime.spawn(async move {
								if let Err(err) = http1::Builder::new().serve_connection(io_stream, vss_service).await {
									warn!("Failed to serve connection: {}", err);
								}
							});
						},
						Err(e) => warn!("Failed to accept connection: {}", e),
					}
				}
				_ = tokio::signal::ctrl_c() => {
					info!("Received CTRL-C, shutting down..");
					break;
				}
				_ = sighup_stream.recv() => {
					if let Err(e) = logger.reopen() {
						error!("Failed to reopen log file on SIGHUP: {e}");
					}
				}
				_ = sigterm_stream.recv() => {
					info!("Received SIGTERM, shutting down..");
					break;
				}
			}
		}
	});
}

/// Initializes Sentry error tracking if configured.
///
/// Sentry must be initialized before the tokio runtime starts to ensure proper
/// Hub inheritance for spawned threads. Returns a guard that must be kept alive
/// for the duration of the program to ensure events are flushed on shutdown.
fn initialize_sentry(
	sentry_config: &Option<util::config::SentryConfig>,
) -> Option<sentry::ClientInitGuard> {
	let config = match sentry_config {
		Some(cfg) => cfg,
		None => return None,
	};

	let dsn = match config.get_dsn() {
		Some(dsn) if !dsn.is_empty() => dsn,
		_ => return None,
	};

	let environment = config.get_environment();
	let sample_rate = config.get_sample_rate();

	let guard = sentry::init((
		dsn,
		sentry::ClientOptions {
			release: sentry::release_name!(),
			environment: environment.map(std::borrow::Cow::Owned),
			sample_rate,
			..Default::default()
		},
	));

	if guard.is_enabled() {
		info!(
			"Sentry initialized (environment: {}, sample_rate: {})",
			config.get_environment().unwrap_or_else(|| "default".to_string()),
			sample_rate
		);
	}

	Some(guard)
}
