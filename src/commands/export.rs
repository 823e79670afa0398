use std::process::ExitCode;

use fex_lib::{ExportError, ExportOutput, Exporter, FexOutput};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, FlagSources};
use crate::formatting::{exit_code, render_error, write_output};
use crate::settings::{format_effective_settings, load_config, resolve_export_settings};

/// Run the export command.
pub async fn run_export(args: Cli, flags: FlagSources) -> ExitCode {
    let format = args.output_format;
    let output = args.output.clone();

    let config = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let settings = match resolve_export_settings(&args, &flags, &config) {
        Ok(settings) => settings,
        Err(err) => return render_error(err, format, output),
    };
    tracing::debug!(
        "{}",
        format_effective_settings(&settings, args.config.as_deref())
    );

    let exporter = match Exporter::from_settings(&settings) {
        Ok(exporter) => exporter,
        Err(err) => return render_error(err, format, output),
    };

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; finishing in-flight downloads");
                cancel.cancel();
            }
        })
    };

    let result = exporter.run(&settings, &cancel).await;
    ctrl_c.abort();

    let report = match result {
        Ok(report) => report,
        Err(err) => return render_error(err, format, output),
    };

    let state = report.state;
    let body = FexOutput::Export(ExportOutput::from_report(
        report,
        settings.image_save_path.clone(),
    ));
    if let Err(err) = write_output(&body, format, output.as_deref()) {
        return render_error(
            ExportError::Config(format!("Failed to write report: {err}")),
            format,
            None,
        );
    }
    exit_code(state)
}
