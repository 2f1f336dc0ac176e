use crate::commands::{build_runtime, load_config, open_service, store_failure, CommandResult};

const COMMAND: &str = "clear-cache";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let service = open_service(&config).await?;
        service.clear_cache().await.map_err(store_failure)
    });

    match result {
        Ok(()) => CommandResult::success(COMMAND, "cleared cached metrics, analyses, and session"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
