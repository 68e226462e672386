//! Colour palette for dialogs, loaded from a `key = value` file.

use ratatui::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub backdrop: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Theme {
    /// Plain terminal colours.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            backdrop: Color::Reset,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::Red,
        }
    }

    /// Catppuccin Mocha palette, the default.
    pub fn mocha() -> Self {
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            backdrop: Color::Rgb(0x1e, 0x1e, 0x2e),     // base
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    /// Load a theme file. `base = dark` starts from [`Theme::dark`]; unknown
    /// keys and unparsable colours keep the base palette.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            // resets every colour, so it belongs on the first line
            if key.trim() == "base" {
                theme = match val.trim() {
                    "dark" => Self::dark(),
                    _ => Self::mocha(),
                };
                continue;
            }
            let Some(color) = parse_color(val) else {
                continue;
            };
            match key.trim() {
                "text" => theme.text = color,
                "muted" => theme.muted = color,
                "title" => theme.title = color,
                "border" => theme.border = color,
                "backdrop" => theme.backdrop = color,
                "highlight_fg" => theme.highlight_fg = color,
                "highlight_bg" => theme.highlight_bg = color,
                "error" => theme.error = color,
                _ => {}
            }
        }
        theme
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

/// Hex (`#RRGGBB` or `RRGGBB`) or `reset`.
fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixes_valid_and_invalid_entries() {
        let t = Theme::parse("text = #112233\ntitle = not-a-color\nbackdrop = reset\nerror=FF0000\nunknown = #abcdef\n");
        assert_eq!(t.text, Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(t.title, Theme::mocha().title);
        assert_eq!(t.backdrop, Color::Reset);
        assert_eq!(t.error, Color::Rgb(0xff, 0, 0));
    }

    #[test]
    fn base_selects_palette() {
        let t = Theme::parse("base = dark
title = #010203
");
        assert_eq!(t.text, Theme::dark().text);
        assert_eq!(t.title, Color::Rgb(1, 2, 3));
    }

    #[test]
    fn missing_file_is_none() {
        assert!(Theme::from_file("/nonexistent/usrgrp-admin/theme.conf").is_none());
    }
}
