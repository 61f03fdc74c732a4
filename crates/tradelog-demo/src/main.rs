// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::{env, thread, time::Duration};

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use tradelog::{Config, Level, Logger};

const LOG_ENV: &str = "TRADELOG_DEMO_LOG";

fn main() -> ExitCode {
    let log_level = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }
    debug!("Logging subsystem enabled");

    let path = env::args_os().nth(1).map(PathBuf::from);
    let config = match Config::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let logger = match Logger::open(&config) {
        Ok(logger) => logger,
        Err(e) => {
            error!("open failed error={e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;

    let builder = logger.record_builder();
    if let Err(e) = builder
        .exchange("binance")
        .symbol("usdt_btc")
        .event("test_event")
        .message("this is a test message")
        .log()
    {
        error!("Failed to write record: {e}");
        failed = true;
    }

    let child = builder
        .exchange("okex")
        .message("this is a test message too!")
        .remote()
        .derive_child([("programme", "tradelog-demo")]);
    if let Err(e) = child.level(Level::Info).set("name", "remote sample").log() {
        error!("Failed to write record: {e}");
        failed = true;
    }

    // Give the background flusher a chance to ship before the final drain.
    thread::sleep(Duration::from_secs(1));

    if let Err(e) = logger.close() {
        error!("close failed error={e}");
        return ExitCode::FAILURE;
    }
    info!("Demo finished");
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
