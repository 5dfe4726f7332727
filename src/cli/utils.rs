use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Outcome line for a maintenance command (`migrate`, `purge-tokens`).
///
/// JSON mode prints one object keyed by `command` and `status`; text mode
/// prints `<command>: <summary>` so the line is greppable in cron logs.
fn render_done(
    output_format: &OutputFormat,
    command: &str,
    summary: &str,
    facts: Map<String, Value>,
) -> anyhow::Result<String> {
    Ok(match output_format {
        OutputFormat::Json => {
            let mut report = Map::new();
            report.insert("command".into(), json!(command));
            report.insert("status".into(), json!("done"));
            report.insert("summary".into(), json!(summary));
            report.extend(facts);
            serde_json::to_string(&Value::Object(report))?
        }
        OutputFormat::Text => format!("{}: {}", command, summary),
    })
}

fn render_failed(output_format: &OutputFormat, command: &str, reason: &str, code: &str) -> anyhow::Result<String> {
    Ok(match output_format {
        OutputFormat::Json => serde_json::to_string(&json!({
            "command": command,
            "status": "failed",
            "reason": reason,
            "code": code,
        }))?,
        OutputFormat::Text => format!("{}: failed [{}] {}", command, code, reason),
    })
}

/// Report a finished command on stdout. `facts` must be a JSON object (or
/// `Value::Null`); its keys are merged into the JSON report.
pub fn report_done(
    output_format: &OutputFormat,
    command: &str,
    summary: &str,
    facts: Value,
) -> anyhow::Result<()> {
    let facts = match facts {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    println!("{}", render_done(output_format, command, summary, facts)?);
    Ok(())
}

/// Report a command that could not run. JSON goes to stdout for scripts,
/// text to stderr.
pub fn report_failed(output_format: &OutputFormat, command: &str, reason: &str, code: &str) -> anyhow::Result<()> {
    let line = render_failed(output_format, command, reason, code)?;
    match output_format {
        OutputFormat::Json => println!("{}", line),
        OutputFormat::Text => eprintln!("{}", line),
    }
    Ok(())
}
