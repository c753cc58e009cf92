//! `encode-config`: base64-encode protected social values in place

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Socials document with key order preserved for rewriting
pub(crate) type RawSocials = IndexMap<String, IndexMap<String, Value>>;

/// Encode the `value` of every dialog social marked `encrypt`.
///
/// Returns the keys that were encoded. Entries are not checked for an
/// existing encoding, so running this twice encodes twice.
pub(crate) fn encode_socials(socials: &mut RawSocials) -> Vec<String> {
    let mut encoded = Vec::new();
    for (key, social) in socials.iter_mut() {
        let is_dialog = social.get("type").and_then(Value::as_str) == Some("dialog");
        let encrypt = social.get("encrypt").and_then(Value::as_bool).unwrap_or(false);
        if !(is_dialog && encrypt) {
            continue;
        }
        let Some(value) = social.get("value").and_then(Value::as_str) else {
            tracing::warn!(key = %key, "encrypted social has no string value, skipping");
            continue;
        };
        let value = STANDARD.encode(value.as_bytes());
        social.insert("value".to_string(), Value::String(value));
        encoded.push(key.clone());
    }
    encoded
}

/// Serialize with 4-space indentation
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .context("failed to serialize socials config")?;
    String::from_utf8(out).context("serialized config is not UTF-8")
}

/// Rewrite a socials config file with protected values encoded
pub(crate) fn encode_config_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut socials: RawSocials =
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;

    let encoded = encode_socials(&mut socials);
    let json = to_pretty_json(&socials)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), encoded = encoded.len(), "socials config encoded");
    Ok(encoded)
}
