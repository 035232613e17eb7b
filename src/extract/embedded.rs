use crate::core::PayloadKind;
use crate::extract::Strategy;
use crate::fetch::Payload;
use crate::normalize::{normalize, FieldAliases};
use crate::record::FieldSet;
use regex::Regex;
use serde_json::Value;

/// Known variable names the source embeds its hydration state under. The
/// set changes across page versions, hence the multi-pattern probe.
const MARKER_PATTERN: &str = r#"window\.__TGT_DATA__\s*=|window\.__PRELOADED_QUERIES__\s*=|window\.__PRELOADED_STATE__\s*=|<script[^>]*id="__NEXT_DATA__"[^>]*>"#;

/// Extracts embedded script JSON blobs from page markup. Each marker hit is
/// followed by a brace-balanced capture, since the blobs sit inside larger
/// script bodies and cannot be delimited by regex alone.
pub struct EmbeddedStrategy;

impl Strategy for EmbeddedStrategy {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn wants(&self) -> PayloadKind {
        PayloadKind::Markup
    }

    fn attempt(&self, payload: &Payload, aliases: &FieldAliases) -> Option<FieldSet> {
        let marker = Regex::new(MARKER_PATTERN).ok()?;

        for hit in marker.find_iter(&payload.body) {
            let Some(blob) = balanced_json(&payload.body[hit.end()..]) else {
                continue;
            };
            let Ok(tree) = serde_json::from_str::<Value>(blob) else {
                continue;
            };
            let fields = normalize(&tree, aliases);
            if fields.is_acceptable() {
                return Some(fields);
            }
        }
        None
    }
}

/// Slice out the first balanced `{...}` object, honoring string literals
/// and escapes.
fn balanced_json(src: &str) -> Option<&str> {
    let start = src.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in src.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&src[start..=offset]);
                }
            }
            _ => {}
        }
    }
    None
}
