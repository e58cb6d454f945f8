use std::fmt::Write as FmtWrite;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cbx_lib::{CbxError, CbxOutput, ErrorOutput, PageOutcome, Result};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(body: &CbxOutput, format: OutputFormat, output: Option<PathBuf>) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string(body)?,
        OutputFormat::Yaml => serde_yaml::to_string(body)?,
        OutputFormat::Pretty => {
            // Human text only for an interactive terminal; files and pipes
            // keep the JSON shape.
            if output.is_none() && std::io::stdout().is_terminal() {
                format_pretty(body, true)
            } else {
                serde_json::to_string_pretty(body)?
            }
        }
    };
    emit(&content, output.as_deref())
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: CbxError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let payload = CbxOutput::Error(ErrorOutput::new(err.to_payload()));

    if let Err(write_err) = write_output(&payload, format, output.clone()) {
        eprintln!("Failed to write error output: {}", write_err);
        if output.is_some() {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            println!("{content}");
        }
    }

    ExitCode::from(2)
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => println!("{content}"),
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &CbxOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        CbxOutput::Analyze(out) => {
            let header = color("[ANALYZE]", "36", colorize);
            writeln!(
                buf,
                "{} {} page(s) analyzed, {} failed",
                header, out.summary.pages_analyzed, out.summary.pages_failed
            )
            .ok();
            writeln!(
                buf,
                "Components: {} unique, {} instances, {} shared across pages",
                out.summary.unique_components,
                out.summary.total_instances,
                out.summary.shared_components
            )
            .ok();

            for page in &out.pages {
                match page {
                    PageOutcome::Analyzed(analysis) => {
                        writeln!(
                            buf,
                            "- {} {}: {} components, {} clusters, {} patterns",
                            color("ok", "32", colorize),
                            analysis.url,
                            analysis.components.len(),
                            analysis.clusters.len(),
                            analysis.patterns.len()
                        )
                        .ok();
                    }
                    PageOutcome::Failed { url, error } => {
                        writeln!(buf, "- {} {}: {}", color("failed", "31", colorize), url, error.message)
                            .ok();
                    }
                }
            }

            let top: Vec<_> = out.aggregated.iter().take(10).collect();
            if !top.is_empty() {
                writeln!(buf, "Top components:").ok();
                for component in top {
                    writeln!(
                        buf,
                        "- {:12} x{:<4} on {} page(s)  {}",
                        component.component_type,
                        component.total_instances,
                        component.page_count,
                        component.hash
                    )
                    .ok();
                }
            }
            write_tokens(&mut buf, &out.tokens);
        }
        CbxOutput::Tokens(out) => {
            let header = color("[TOKENS]", "34", colorize);
            writeln!(buf, "{} from {} page(s)", header, out.summary.pages_analyzed).ok();
            write_tokens(&mut buf, &out.tokens);
        }
        CbxOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out.message.as_deref().unwrap_or(out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn write_tokens(buf: &mut String, tokens: &cbx_lib::DesignTokens) {
    let scale: Vec<String> = tokens.spacing.scale.iter().map(u32::to_string).collect();
    writeln!(
        buf,
        "Spacing: base {}px, scale [{}]",
        tokens.spacing.base_unit,
        scale.join(", ")
    )
    .ok();
    if tokens.variants.is_empty() {
        return;
    }
    writeln!(buf, "Variants:").ok();
    for variant in &tokens.variants {
        let sizes: Vec<&str> = variant.sizes.iter().map(|s| s.name.as_str()).collect();
        let colors: Vec<&str> = variant.colors.iter().map(|c| c.role.as_str()).collect();
        writeln!(
            buf,
            "- {:12} x{:<4} sizes [{}] colors [{}]",
            variant.component_type,
            variant.instances,
            sizes.join(", "),
            colors.join(", ")
        )
        .ok();
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}
