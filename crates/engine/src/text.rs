// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTML to plain text conversion with line-break preservation.
//!
//! The external side's plain-text fields cannot hold markup, so rich-text
//! descriptions are flattened: structural tags become line breaks or tabs,
//! `<head>`/`<script>`/`<style>` blocks vanish whole, a fixed entity set is
//! substituted, and everything else is stripped. Output always uses CRLF
//! line endings. Any input the scanner cannot make sense of is returned
//! unchanged rather than mangled.

const MAX_BREAK_RUN: usize = 3;
const MAX_TAB_RUN: usize = 4;

/// Convert HTML to plain text. Falls back to the original string when the
/// markup is malformed beyond recovery.
pub fn html_to_text(input: &str) -> String {
    match normalize(input) {
        Some(text) => text,
        None => input.to_string(),
    }
}

fn normalize(input: &str) -> Option<String> {
    let mut source = input.to_string();
    for block in ["head", "script", "style"] {
        source = remove_blocks(&source, block);
    }

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '<' => {
                let close = chars[i..].iter().position(|&c| c == '>')?;
                let tag: String = chars[i + 1..i + close].iter().collect();
                out.push_str(tag_replacement(&tag));
                i += close + 1;
            }
            '&' => {
                let window_end = (i + 8).min(chars.len());
                match chars[i + 1..window_end].iter().position(|&c| c == ';') {
                    Some(semi) => {
                        let name: String =
                            chars[i + 1..i + 1 + semi].iter().collect::<String>().to_lowercase();
                        match entity_replacement(&name) {
                            Entity::Replace(text) => out.push_str(text),
                            Entity::Drop => {}
                            Entity::Keep => {
                                out.push('&');
                                out.push_str(&name);
                                out.push(';');
                            }
                        }
                        i += semi + 2;
                    }
                    None => {
                        out.push('&');
                        i += 1;
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Some(collapse(&out))
}

fn tag_replacement(tag: &str) -> &'static str {
    let inner = tag.trim();
    if inner.starts_with('/') {
        return "";
    }
    let name: String = inner
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/')
        .collect::<String>()
        .to_lowercase();
    match name.as_str() {
        "br" | "li" => "\r\n",
        "p" | "div" | "tr" => "\r\n\r\n",
        "td" => "\t",
        _ => "",
    }
}

enum Entity {
    Replace(&'static str),
    Drop,
    Keep,
}

fn entity_replacement(name: &str) -> Entity {
    match name {
        "nbsp" => Entity::Replace(" "),
        "bull" => Entity::Replace(" * "),
        "lt" => Entity::Replace("<"),
        "gt" => Entity::Replace(">"),
        "copy" => Entity::Replace("(c)"),
        "reg" => Entity::Replace("(r)"),
        "trade" => Entity::Replace("(tm)"),
        other if (2..=6).contains(&other.len()) => Entity::Drop,
        _ => Entity::Keep,
    }
}

/// Remove `<name ...>...</name>` blocks in full, case-insensitively. An
/// unterminated block is removed to end of input.
fn remove_blocks(source: &str, name: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original
    let lower = source.to_ascii_lowercase();
    let open_tag = format!("<{name}");
    let close_tag = format!("</{name}>");
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&open_tag) {
        let start = pos + found;
        // Require a real tag boundary so "<script" does not match "<scriptx"
        let after = lower[start + open_tag.len()..].chars().next();
        if !matches!(after, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/'))
        {
            out.push_str(&source[pos..start + open_tag.len()]);
            pos = start + open_tag.len();
            continue;
        }
        out.push_str(&source[pos..start]);
        match lower[start..].find(&close_tag) {
            Some(close) => pos = start + close + close_tag.len(),
            None => return out,
        }
    }
    out.push_str(&source[pos..]);
    out
}

/// Normalize line endings to CRLF and cap break/tab runs.
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut breaks = 0usize;
    let mut tabs = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                breaks += 1;
                tabs = 0;
                if breaks <= MAX_BREAK_RUN {
                    out.push_str("\r\n");
                }
            }
            '\t' => {
                tabs += 1;
                breaks = 0;
                if tabs <= MAX_TAB_RUN {
                    out.push('\t');
                }
            }
            other => {
                breaks = 0;
                tabs = 0;
                out.push(other);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
