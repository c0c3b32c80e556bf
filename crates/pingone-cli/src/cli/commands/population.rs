use pingone_cache::Settings;

use crate::cli::args::PopulationArgs;
use crate::exit_codes;

pub async fn run(args: PopulationArgs, settings: &Settings) -> anyhow::Result<i32> {
    let creds = settings.credentials()?;
    let resolver = settings.population_resolver()?;

    let population_id = resolver.resolve(&creds).await?;

    if args.json {
        let out = serde_json::json!({
            "key": creds.scope().cache_key(),
            "population_id": population_id,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{population_id}");
    }
    Ok(exit_codes::SUCCESS)
}
