use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use bookshelf::config::{ServerConfig, StoreBackend, StoreConfig};
use bookshelf::{http, logging, BookService, StoreClient};

/// Book resource API over HTTP.
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, env = "BOOKSHELF_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(short, long, env = "BOOKSHELF_PORT", default_value_t = 8080)]
    port: u16,

    /// Document store backend: memory or file
    #[arg(long, env = "BOOKSHELF_STORE", default_value = "memory")]
    store: StoreBackend,

    /// Data directory for the file backend
    #[arg(long, env = "BOOKSHELF_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Deadline for store calls per request, in milliseconds (0 = none)
    #[arg(long, env = "BOOKSHELF_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    request_timeout_ms: u64,

    /// Log filter, e.g. "info" or "bookshelf=debug"
    #[arg(long, env = "BOOKSHELF_LOG", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            request_timeout_ms: self.request_timeout_ms,
            store: StoreConfig {
                backend: self.store,
                data_dir: self.data_dir,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = logging::init_logging(Some(&args.log_level)) {
        eprintln!("{}", err);
    }
    let config = args.into_config();

    let store = match StoreClient::connect(&config.store).await {
        Ok(store) => store,
        Err(err) => {
            log::error!("startup failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let service = Arc::new(BookService::new(store));
    if let Err(err) = http::serve(service, &config).await {
        log::error!("server error: {}", err);
        return ExitCode::FAILURE;
    }

    log::info!("server stopped");
    ExitCode::SUCCESS
}
