//! Plain-text transcripts of model answers, one file per reply.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::client::ModelReply;

/// File name for a reply: the response id without its `chat_` prefix, or a
/// UTC timestamp when the endpoint sent no id.
pub fn answer_file_name(reply: &ModelReply) -> String {
    match reply.raw.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {
            let id = id.strip_prefix("chat_").unwrap_or(id);
            let safe: String = id
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect();
            format!("{safe}.txt")
        }
        _ => format!("answer-{}.txt", Utc::now().format("%Y%m%d-%H%M%S%.3f")),
    }
}

/// Render the transcript. Bodies that are not chat-completions shaped fall
/// back to pretty-printed JSON.
pub fn format_answer(reply: &ModelReply) -> String {
    format_structured(reply).unwrap_or_else(|| {
        serde_json::to_string_pretty(&reply.raw).unwrap_or_else(|_| reply.text.clone())
    })
}

fn format_structured(reply: &ModelReply) -> Option<String> {
    let choice = reply.raw.get("choices")?.as_array()?.first()?;
    let message = choice.get("message")?;

    let created = reply
        .raw
        .get("created")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);
    let tokens = |t: Option<u64>| t.map_or_else(|| "-".to_string(), |n| n.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "CREATED: {}", created.to_rfc3339());
    let _ = writeln!(out, "MODEL: {}", reply.model);
    let _ = writeln!(out, "PROMPT: {}", tokens(reply.prompt_tokens));
    let _ = writeln!(out, "COMPLETION: {}", tokens(reply.completion_tokens));
    let _ = writeln!(
        out,
        "REASON: {}",
        choice.get("finish_reason").and_then(Value::as_str).unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "ROLE: {}",
        message.get("role").and_then(Value::as_str).unwrap_or("assistant")
    );
    let _ = write!(out, "MESSAGES:\n```\n{}\n```\n", reply.text.trim_end());
    Some(out)
}

/// Write the transcript of `reply` into `dir`, creating it if needed.
pub fn write_answer(dir: &Path, reply: &ModelReply) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(answer_file_name(reply));
    fs::write(&path, format_answer(reply))?;
    Ok(path)
}
