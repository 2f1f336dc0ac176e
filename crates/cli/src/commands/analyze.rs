use crate::commands::{
    build_runtime, load_config, open_service, remember_selection, widget_payload, CommandResult,
    Failure, TargetArgs,
};

const COMMAND: &str = "analyze";

/// Always regenerates; a cached analysis is never reused here.
pub fn run(args: TargetArgs) -> CommandResult {
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
        let data = service.get_widget_data(args.request(&config)).await;
        remember_selection(&service, args.tier, &data.record).await;

        let analysis = service
            .run_analysis(&data.record, args.tier)
            .await
            .map_err(|error| (error.error_class(), error.user_message().to_string(), 5u8))?;

        let message = format!("generated analysis for {}", data.record.name);
        Ok::<_, Failure>((message, widget_payload(&data.record, Some(&analysis), None)))
    });

    match result {
        Ok((message, payload)) => CommandResult::success_with(COMMAND, message, Some(payload)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
