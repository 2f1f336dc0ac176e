use clap::Args;
use tracing::info;

use crate::commands::{
    build_runtime, load_config, open_service, remember_selection, store_failure, widget_payload,
    CommandResult, Failure, TargetArgs,
};

const COMMAND: &str = "widget";

#[derive(Debug, Clone, Args)]
pub struct WidgetArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[arg(long, help = "Generate an AI analysis when none is cached")]
    pub analyze: bool,
    #[arg(long, help = "Clear all cached state before loading")]
    pub refresh: bool,
}

impl WidgetArgs {
    pub fn new(target: TargetArgs) -> Self {
        Self { target, analyze: false, refresh: false }
    }
}

pub fn run(args: WidgetArgs) -> CommandResult {
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
        if args.refresh {
            service.clear_cache().await.map_err(store_failure)?;
        }

        let data = service.get_widget_data(args.target.request(&config)).await;
        let mut analysis = data.analysis;
        let mut analysis_error = None;
        if analysis.is_none() && args.analyze {
            match service.run_analysis(&data.record, args.target.tier).await {
                Ok(generated) => analysis = Some(generated),
                // Metrics stay usable; the widget shows a degraded summary.
                Err(error) => analysis_error = Some(error.user_message()),
            }
        }

        remember_selection(&service, args.target.tier, &data.record).await;
        info!(
            event_name = "cli.widget.loaded",
            business_id = %data.record.id,
            provenance = data.record.provenance(),
            has_analysis = analysis.is_some(),
            "widget data loaded"
        );

        let message = format!("loaded {} data for {}", data.record.provenance(), data.record.name);
        let payload = widget_payload(&data.record, analysis.as_ref(), analysis_error);
        Ok::<_, Failure>((message, payload))
    });

    match result {
        Ok((message, payload)) => CommandResult::success_with(COMMAND, message, Some(payload)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
