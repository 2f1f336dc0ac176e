use std::time::Duration;

use serde_json::{json, Value};
use velocity_places::BusinessProfileClient;

use crate::commands::{build_runtime, load_config, CommandResult, Failure};

const COMMAND: &str = "locations";

pub fn run(access_token: &str) -> CommandResult {
    if access_token.trim().is_empty() {
        return CommandResult::failure(
            COMMAND,
            "invalid_token",
            "an access token is required to list locations",
            2,
        );
    }
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.places.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|error| ("runtime_init", error.to_string(), 3u8))?;
        let profiles = BusinessProfileClient::from_config(client, &config.places);

        let locations: Vec<Value> = profiles
            .list_all_locations(access_token)
            .await
            .iter()
            .map(|location| {
                json!({
                    "name": location.name,
                    "title": location.title,
                    "store_code": location.store_code,
                    "place_id": location.place_id,
                    "selection_id": location.selection_id(),
                })
            })
            .collect();
        Ok::<_, Failure>(locations)
    });

    match result {
        Ok(locations) => CommandResult::success_with(
            COMMAND,
            format!("found {} location(s)", locations.len()),
            Some(json!({ "locations": locations })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
