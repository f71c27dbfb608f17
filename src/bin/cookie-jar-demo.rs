//! Cookie Jar Demo
//!
//! Seeds a jar from the command line, lets the sweeper run and logs every
//! expiry and near-expiry notification.

use anyhow::Context;
use clap::Parser;
use requester::{Cookie, CookieJar, JarConfig, SharedTable, TableBackend};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Watch cookies age inside a TTL cookie jar
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Cookie to insert as name=value[:max_age] (repeatable)
    #[arg(short, long = "cookie")]
    cookies: Vec<String>,

    /// Near-expiry threshold in seconds
    #[arg(short, long, default_value_t = 60)]
    threshold: u64,

    /// Sweep interval in seconds
    #[arg(short, long, default_value_t = 1)]
    interval: u64,

    /// How long to let the sweeper run, in seconds
    #[arg(long, default_value_t = 5)]
    run_for: u64,

    /// Mirror the jar into an external cookie table and print it at the end
    #[arg(long, default_value_t = false)]
    mirror: bool,
}

fn parse_cookie(spec: &str) -> anyhow::Result<Cookie> {
    let (name, rest) = spec
        .split_once('=')
        .with_context(|| format!("cookie '{}' must look like name=value[:max_age]", spec))?;
    if name.is_empty() {
        anyhow::bail!("cookie '{}' has an empty name", spec);
    }

    let cookie = match rest.rsplit_once(':') {
        Some((value, max_age)) => {
            let max_age: i64 = max_age
                .parse()
                .with_context(|| format!("invalid max_age in '{}'", spec))?;
            Cookie::new(name, value).with_max_age(max_age)
        }
        None => Cookie::new(name, rest),
    };
    Ok(cookie)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("requester=info".parse()?))
        .init();

    let args = Args::parse();

    let config = JarConfig::default()
        .with_sweep_interval(Duration::from_secs(args.interval))
        .with_near_expiry_threshold(Duration::from_secs(args.threshold));

    let table = SharedTable::new();
    let jar = if args.mirror {
        CookieJar::with_backend(config, TableBackend::new(table.clone()))?
    } else {
        CookieJar::with_config(config)?
    };

    jar.set_on_expire(|cookie| info!(cookie = %cookie, "Cookie expired"));
    jar.set_on_near_expiry(|cookie| {
        info!(cookie = %cookie.name, max_age = cookie.max_age, "Cookie close to expiry")
    });

    for spec in &args.cookies {
        let cookie = parse_cookie(spec)?;
        if let Err(e) = jar.insert(cookie) {
            warn!("Skipping {}: {}", spec, e);
        }
    }

    info!(
        "Watching {} cookies for {}s (interval {}s, threshold {}s)",
        jar.len(),
        args.run_for,
        args.interval,
        args.threshold
    );
    tokio::time::sleep(Duration::from_secs(args.run_for)).await;
    jar.stop();

    println!("{}", String::from_utf8_lossy(&jar.as_json(&[])?));
    if args.mirror {
        println!("table: {}", table.to_cookie_string());
    }
    info!("{}", jar.metrics().summary());

    Ok(())
}
