use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use hashkeep::cli::{Cli, Config, Mode};
use hashkeep::digest::bytes_to_hex;
use hashkeep::router::StoreRouter;
use hashkeep::scan::ScanEngine;
use hashkeep::stream;
use hashkeep::verify::VerifyEngine;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let config = Config::from_cli(Cli::parse());

    if !config.quiet {
        println!("hashkeep v{} - checksum tool\n", env!("CARGO_PKG_VERSION"));
    }

    if config.mode == Mode::Stdin {
        let digest = stream::hash_stdin(config.algorithm)?;
        println!("{}:{}", config.algorithm, bytes_to_hex(&digest));
        return Ok(ExitCode::SUCCESS);
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupt);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .context("installing interrupt handler")?;
    }

    let mut router = StoreRouter::new(&config);

    let mut code = if config.mode == Mode::Verify {
        let stats = VerifyEngine::new().run(&config, &mut router, &interrupt);
        if stats.failed > 0 {
            2
        } else if stats.mismatches > 0 {
            1
        } else {
            0
        }
    } else {
        let stats = ScanEngine::new().run(&config, &mut router, &interrupt);
        if stats.failed > 0 {
            2
        } else {
            0
        }
    };

    // Stores flush exactly once, including when the loop was interrupted
    router.close();
    if router.read_failed() || router.write_failed() {
        code = 2;
    }

    if interrupt.load(Ordering::Relaxed) && !config.quiet {
        println!("Interrupted.");
    }

    Ok(ExitCode::from(code))
}
