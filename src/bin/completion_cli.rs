//! completion-cli: ask a completion backend through the response cache
//!
//! Usage:
//!   completion-cli complete [OPTIONS] <fragment>...   Print a (possibly cached) completion
//!   completion-cli cache list|remove <key>|purge       Manage the configured cache store
//!   completion-cli key [OPTIONS] <fragment>...         Print the cache key for a request

use anyhow::{anyhow, bail, Context};
use completion_cache::cache::{derive_key, open_store, CacheKey};
use completion_cache::config::ClientConfig;
use completion_cache::drivers::BackendKind;
use completion_cache::{CancellationToken, CompletionClientBuilder, CompletionSource};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "complete" => cmd_complete(&args[2..]).await,
        "cache" => cmd_cache(&args[2..]).await,
        "key" => cmd_key(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("completion-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"completion-cli: cached completions

USAGE:
    completion-cli <COMMAND> [OPTIONS]

COMMANDS:
    complete <fragment>...      Print the completion for the joined fragments
    cache list                  List cached entries
    cache remove <key>          Remove one cached entry
    cache purge                 Remove every cached entry
    key <fragment>...           Print the cache key for the joined fragments
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <path>             Config file (default: user config dir)
    --backend <name>            openai | netd | noop
    --language <lang>           Language hint (default: english)
    --model <model>             Model identifier
    --client <name>             Client identity for `key` (default: backend name)
    --no-cache                  Skip cache reads (responses are still stored)

ENVIRONMENT:
    OPENAI_API_KEY, NETD_API_KEY    Backend tokens when none is configured
    COMPLETION_HTTP_TIMEOUT_SECS    HTTP timeout (default 30)
    COMPLETION_PROXY_URL            Proxy for backend requests
    RUST_LOG                        Log filter (default: warn)"#
    );
}

#[derive(Debug, Default)]
struct Opts {
    config: Option<PathBuf>,
    backend: Option<BackendKind>,
    language: Option<String>,
    model: Option<String>,
    client: Option<String>,
    no_cache: bool,
    positional: Vec<String>,
}

fn take_value(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> anyhow::Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn parse_opts(args: &[String]) -> anyhow::Result<Opts> {
    let mut opts = Opts::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => opts.config = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "--backend" => opts.backend = Some(take_value(&mut iter, arg)?.parse()?),
            "--language" => opts.language = Some(take_value(&mut iter, arg)?),
            "--model" => opts.model = Some(take_value(&mut iter, arg)?),
            "--client" => opts.client = Some(take_value(&mut iter, arg)?),
            "--no-cache" => opts.no_cache = true,
            "--" => {
                opts.positional.extend(iter.by_ref().cloned());
                break;
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ => opts.positional.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn load_config(opts: &Opts) -> anyhow::Result<ClientConfig> {
    let mut cfg = ClientConfig::load_or_default(opts.config.as_deref()).context("loading configuration")?;
    if let Some(kind) = opts.backend {
        cfg.backend = kind;
    }
    if let Some(ref lang) = opts.language {
        cfg.language = lang.clone();
    }
    if let Some(ref model) = opts.model {
        cfg.backend_config.model = Some(model.clone());
    }
    if opts.no_cache {
        cfg.cache.enabled = false;
    }
    Ok(cfg)
}

async fn cmd_complete(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_opts(args)?;
    if opts.positional.is_empty() {
        bail!("Usage: completion-cli complete [OPTIONS] <fragment>...");
    }
    let cfg = load_config(&opts)?;
    let client = CompletionClientBuilder::from_config(&cfg)
        .client_name(client_name(&opts, &cfg))
        .build()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = client.complete_detailed(&cancel, &opts.positional).await?;
    if outcome.source == CompletionSource::DecodeFailure {
        eprintln!("warning: cached entry {} could not be decoded", outcome.key);
    }
    println!("{}", outcome.text);
    Ok(())
}

async fn cmd_cache(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_opts(args)?;
    let cfg = load_config(&opts)?;
    let store = open_store(&cfg.cache)?;

    match opts.positional.first().map(String::as_str) {
        Some("list") => {
            let items = store.list().await?;
            if items.is_empty() {
                println!("Cache is empty.");
            }
            for item in items {
                let updated = item
                    .updated_at
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs().to_string())
                    .unwrap_or_else(|| "-".into());
                println!("{}  {:>8} B  {}", item.key, item.size, updated);
            }
        }
        Some("remove") => {
            let key = opts
                .positional
                .get(1)
                .ok_or_else(|| anyhow!("Usage: completion-cli cache remove <key>"))?;
            if store.remove(&CacheKey::new(key.as_str())).await? {
                println!("Removed {key}");
            } else {
                bail!("no cache entry named {key}");
            }
        }
        Some("purge") => {
            store.clear().await?;
            println!("Cache purged.");
        }
        Some(other) => bail!("unknown cache command {other}"),
        None => bail!("Usage: completion-cli cache list|remove <key>|purge"),
    }
    Ok(())
}

/// Name mixed into cache keys: `--client`, else the configured backend.
fn client_name(opts: &Opts, cfg: &ClientConfig) -> String {
    opts.client.clone().unwrap_or_else(|| cfg.backend.to_string())
}

fn key_for(opts: &Opts, cfg: &ClientConfig) -> CacheKey {
    derive_key(&client_name(opts, cfg), &cfg.language, &opts.positional)
}

fn cmd_key(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_opts(args)?;
    let cfg = load_config(&opts)?;
    println!("{}", key_for(&opts, &cfg));
    Ok(())
}
