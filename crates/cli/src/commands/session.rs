use clap::Subcommand;
use serde_json::json;

use crate::commands::{
    build_runtime, load_config, open_service, store_failure, CommandResult, Failure,
};

const COMMAND: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum SessionAction {
    #[command(about = "Print the saved tier and business selection")]
    Show,
    #[command(about = "End the session and clear all cached state")]
    Clear,
}

pub fn run(action: SessionAction) -> CommandResult {
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
        match action {
            SessionAction::Show => {
                let session = service.restore_session().await;
                let message =
                    if session.is_some() { "restored saved session" } else { "no saved session" };
                Ok::<_, Failure>((message, json!({ "session": session })))
            }
            SessionAction::Clear => {
                service.end_session().await.map_err(store_failure)?;
                Ok(("session ended and cache cleared", json!({ "session": null })))
            }
        }
    });

    match result {
        Ok((message, payload)) => CommandResult::success_with(COMMAND, message, Some(payload)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
