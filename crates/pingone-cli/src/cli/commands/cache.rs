use pingone_cache::{EntryStatus, Settings};

use crate::cli::args::{CacheArgs, CacheCommand};
use crate::exit_codes;

pub async fn run(args: CacheArgs, settings: &Settings) -> anyhow::Result<i32> {
    let cache = settings.resource_cache()?;

    match args.cmd {
        CacheCommand::Get => {
            let scope = settings.scope()?;
            match cache.get::<String>(&scope).await? {
                Some(id) => {
                    println!("{id}");
                    Ok(exit_codes::SUCCESS)
                }
                None => {
                    eprintln!("no fresh entry for {}", scope.cache_key());
                    Ok(exit_codes::CACHE_MISS)
                }
            }
        }
        CacheCommand::Set { population_id } => {
            let scope = settings.scope()?;
            cache.set(&scope, &population_id).await?;
            eprintln!("cached {} for {}", population_id, scope.cache_key());
            Ok(exit_codes::SUCCESS)
        }
        CacheCommand::List { json } => {
            let entries = cache.entries().await?;
            if json {
                let out: Vec<_> = entries.iter().map(entry_json).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if entries.is_empty() {
                eprintln!("cache is empty");
            } else {
                for e in &entries {
                    println!(
                        "{}\t{}\t{}\t{}",
                        e.key,
                        e.entry.value,
                        if e.fresh { "fresh" } else { "stale" },
                        e.age_ms
                            .map(|ms| format!("{}s", ms / 1000))
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn entry_json(e: &EntryStatus) -> serde_json::Value {
    serde_json::json!({
        "key": e.key,
        "value": e.entry.value,
        "timestamp": e.entry.timestamp,
        "fresh": e.fresh,
        "age_ms": e.age_ms,
    })
}
