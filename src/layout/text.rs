use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LayoutConfig;
use crate::theme::Theme;

use super::TextBlock;

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|\\n|\r?\n").expect("line break pattern"));

pub(super) fn measure_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    let font_size = theme.font_size;
    let max_width_px = config.max_label_width_chars.max(1) as f32 * average_char_width(font_size);
    let mut lines = Vec::new();
    for line in split_lines(text) {
        lines.extend(wrap_line(&line, max_width_px, font_size));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let width = lines
        .iter()
        .map(|line| text_width(line, font_size))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * config.label_line_height;

    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    LINE_BREAK_RE
        .split(text)
        .map(|line| line.trim().to_string())
        .collect()
}

pub(super) fn wrap_line(line: &str, max_width: f32, font_size: f32) -> Vec<String> {
    if text_width(line, font_size) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, font_size) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub(super) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn average_char_width(font_size: f32) -> f32 {
    font_size * 0.56
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Approximate advance widths for a sans-serif face, as a fraction of the
    // font size.
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '\'' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.25,
        'f' | 'r' | 't' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.946,
        c if !c.is_ascii() => 1.0,
        _ => 0.568,
    }
}
