use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use cbx_lib::{
    summarize_site, AnalyzeOutput, CbxError, CbxOutput, Config, OutputMode, PageAnalyzer,
    PageCapture, PageOutcome, TokensOutput,
};

use crate::cli::RunArgs;
use crate::formatting::{render_error, write_output};

/// Run `analyze` or `tokens`. Pages are analyzed concurrently on the
/// blocking pool; a page that cannot be read or analyzed is reported as
/// failed without stopping the others.
pub async fn run_analysis(mode: OutputMode, config_path: Option<PathBuf>, args: RunArgs) -> ExitCode {
    let config = match resolve_config(config_path.as_deref(), &args) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, args.format, args.output.clone()),
    };
    debug!(?config, "effective config");

    let viewport = config.viewport;
    let analyzer = Arc::new(PageAnalyzer::new(config));
    let inputs: Vec<String> = args
        .captures
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    let tasks = args.captures.iter().cloned().map(|path| {
        let analyzer = Arc::clone(&analyzer);
        async move { analyze_file(analyzer, path).await }
    });
    let pages: Vec<PageOutcome> = join_all(tasks).await;

    let site = summarize_site(&analyzer, pages);
    info!(
        analyzed = site.summary.pages_analyzed,
        failed = site.summary.pages_failed,
        unique = site.summary.unique_components,
        "site analysis finished"
    );

    let body = match mode {
        OutputMode::Analyze => CbxOutput::Analyze(AnalyzeOutput::new(viewport, inputs, site)),
        OutputMode::Tokens => CbxOutput::Tokens(TokensOutput::new(inputs, site)),
    };
    match write_output(&body, args.format, args.output.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err, args.format, None),
    }
}

/// Config file first, then CLI overrides, then validation.
fn resolve_config(path: Option<&Path>, args: &RunArgs) -> cbx_lib::Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(confidence) = args.confidence {
        config.detection.confidence_threshold = confidence;
    }
    if let Some(viewport) = args.viewport {
        config.viewport = viewport;
    }
    config.validate()?;
    Ok(config)
}

async fn analyze_file(analyzer: Arc<PageAnalyzer>, path: PathBuf) -> PageOutcome {
    let label = path.display().to_string();
    let capture = match load_capture(&path).await {
        Ok(capture) => capture,
        Err(err) => return failed(label, err),
    };
    let url = capture.url.clone();

    let joined = tokio::task::spawn_blocking(move || analyzer.analyze(&capture)).await;
    match joined {
        Ok(Ok(page)) => PageOutcome::Analyzed(Box::new(page)),
        Ok(Err(err)) => failed(url, err),
        Err(join_err) => failed(
            url,
            CbxError::analysis(format!("analysis task aborted: {join_err}")),
        ),
    }
}

async fn load_capture(path: &Path) -> cbx_lib::Result<PageCapture> {
    let text = tokio::fs::read_to_string(path).await?;
    let mut capture: PageCapture = serde_json::from_str(&text)?;
    if capture.url.is_empty() {
        capture.url = path.display().to_string();
    }
    Ok(capture)
}

fn failed(url: String, err: CbxError) -> PageOutcome {
    warn!(%url, error = %err, "page skipped");
    PageOutcome::Failed {
        url,
        error: err.to_payload(),
    }
}
