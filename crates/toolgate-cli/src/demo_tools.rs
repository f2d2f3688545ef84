//! Built-in demo tools served by the CLI

use chrono::Utc;
use serde_json::{Value, json};
use std::time::Duration;
use toolgate_core::registry::{ToolBuilder, ToolRegistry};
use toolgate_core::{SharedEmitter, ToolError, ToolgateResult, handler_fn};

/// Results of `word_count` stay fresh for ten minutes
const WORD_COUNT_TTL: Duration = Duration::from_secs(600);
const COUNTDOWN_DEFAULT_FROM: u64 = 5;
const COUNTDOWN_MAX_FROM: u64 = 1000;
const COUNTDOWN_DEFAULT_INTERVAL_MS: u64 = 200;

/// Registry holding every demo tool
pub fn registry() -> ToolgateResult<ToolRegistry> {
    Ok(ToolRegistry::new()
        .with_tool(echo()?)
        .with_tool(word_count()?)
        .with_tool(countdown()?)
        .with_tool(now()?))
}

fn text_arg(args: &Value) -> Result<&str, ToolError> {
    args.get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("'text' must be a string".to_string()))
}

fn u64_arg(args: &Value, name: &str, default: u64) -> Result<u64, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value.as_u64().ok_or_else(|| {
            ToolError::InvalidArguments(format!("'{}' must be a non-negative integer", name))
        }),
    }
}

fn echo() -> ToolgateResult<toolgate_core::ToolDefinition> {
    ToolBuilder::new("echo")
        .description("Echo the given text back")
        .string_param("text", "Text to echo", true)
        .cacheable(None)
        .tag("demo")
        .handler(handler_fn(|args: Value, _emitter| async move {
            let text = text_arg(&args)?;
            Ok(json!({ "text": text }))
        }))
        .build()
}

fn word_count() -> ToolgateResult<toolgate_core::ToolDefinition> {
    ToolBuilder::new("word_count")
        .description("Count words, lines and characters in text")
        .string_param("text", "Text to analyse", true)
        .cacheable(WORD_COUNT_TTL)
        .tag("demo")
        .tag("text")
        .handler(handler_fn(|args: Value, _emitter| async move {
            let text = text_arg(&args)?;
            Ok(json!({
                "words": text.split_whitespace().count(),
                "lines": text.lines().count(),
                "chars": text.chars().count(),
            }))
        }))
        .build()
}

fn countdown() -> ToolgateResult<toolgate_core::ToolDefinition> {
    ToolBuilder::new("countdown")
        .description("Count down to zero, streaming each step")
        .integer_param("from", "Starting number (default 5)", false)
        .integer_param("interval_ms", "Delay between steps (default 200)", false)
        .streaming()
        .tag("demo")
        .handler(handler_fn(|args: Value, emitter: SharedEmitter| async move {
            let from = u64_arg(&args, "from", COUNTDOWN_DEFAULT_FROM)?;
            if from > COUNTDOWN_MAX_FROM {
                return Err(ToolError::InvalidArguments(format!(
                    "'from' must be at most {}",
                    COUNTDOWN_MAX_FROM
                )));
            }
            let interval = Duration::from_millis(u64_arg(
                &args,
                "interval_ms",
                COUNTDOWN_DEFAULT_INTERVAL_MS,
            )?);

            for step in 1..=from {
                let remaining = from - step;
                emitter.emit_progress(step, from, &format!("{} left", remaining))?;
                emitter.emit_data(json!(remaining))?;

                if remaining > 0 {
                    tokio::select! {
                        _ = emitter.context().cancelled() => return Err(ToolError::Cancelled),
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
            }
            Ok(Value::Null)
        }))
        .build()
}

fn now() -> ToolgateResult<toolgate_core::ToolDefinition> {
    ToolBuilder::new("now")
        .description("Current UTC time")
        .non_cacheable()
        .tag("demo")
        .handler(handler_fn(|_args, _emitter| async move {
            let now = Utc::now();
            Ok(json!({
                "utc": now.to_rfc3339(),
                "unix_ms": now.timestamp_millis(),
            }))
        }))
        .build()
}
