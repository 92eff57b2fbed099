//! RTF control-word decoder.
//!
//! Handles enough of RTF 1.9 to recover readable text from the license files
//! games ship: groups, paragraph/line breaks, tabs, `\'hh` escapes (decoded as
//! Windows-1252), `\uN` Unicode escapes with their `\ucN` fallback skipping,
//! and ignorable destinations (font/colour/style tables, metadata, pictures).

/// Destinations whose content is never document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "xmlnstbl",
    "generator",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "object",
    "fldinst",
    "filetbl",
    "revtbl",
    "bkmkstart",
    "bkmkend",
];

#[derive(Clone, Copy)]
struct GroupState {
    skip: bool,
    /// Fallback characters following each `\uN`.
    uc: usize,
}

struct Decoder {
    out: String,
    pending_bytes: Vec<u8>,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Fallback characters still to drop after a `\uN`.
    fallback_left: usize,
}

impl Decoder {
    fn new() -> Self {
        Self {
            out: String::new(),
            pending_bytes: Vec::new(),
            state: GroupState { skip: false, uc: 1 },
            stack: Vec::new(),
            fallback_left: 0,
        }
    }

    fn flush_bytes(&mut self) {
        if self.pending_bytes.is_empty() {
            return;
        }
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&self.pending_bytes);
        self.out.push_str(&text);
        self.pending_bytes.clear();
    }

    fn emit(&mut self, c: char) {
        if self.fallback_left > 0 {
            self.fallback_left -= 1;
            return;
        }
        if self.state.skip {
            return;
        }
        self.flush_bytes();
        self.out.push(c);
    }

    fn emit_byte(&mut self, b: u8) {
        if self.fallback_left > 0 {
            self.fallback_left -= 1;
            return;
        }
        if !self.state.skip {
            self.pending_bytes.push(b);
        }
    }

    fn open_group(&mut self) {
        self.flush_bytes();
        self.stack.push(self.state);
        self.fallback_left = 0;
    }

    fn close_group(&mut self) {
        self.flush_bytes();
        if let Some(prev) = self.stack.pop() {
            self.state = prev;
        }
        self.fallback_left = 0;
    }

    fn control_word(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" | "line" | "sect" | "page" | "row" => {
                self.fallback_left = 0;
                self.emit('\n');
            }
            "tab" | "cell" => self.emit('\t'),
            "emdash" => self.emit('\u{2014}'),
            "endash" => self.emit('\u{2013}'),
            "bullet" => self.emit('\u{2022}'),
            "lquote" => self.emit('\u{2018}'),
            "rquote" => self.emit('\u{2019}'),
            "ldblquote" => self.emit('\u{201C}'),
            "rdblquote" => self.emit('\u{201D}'),
            "uc" => self.state.uc = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(n) = param {
                    let code = (if n < 0 { n + 65536 } else { n }) as u32;
                    let c = char::from_u32(code).unwrap_or('\u{FFFD}');
                    self.fallback_left = 0;
                    self.emit(c);
                    self.fallback_left = self.state.uc;
                }
            }
            w if SKIPPED_DESTINATIONS.contains(&w) => self.state.skip = true,
            _ => {}
        }
    }
}

/// Converts RTF markup to plain text. Malformed input degrades to whatever
/// text could be recovered; this never fails.
pub fn rtf_to_text(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut d = Decoder::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => {
                d.open_group();
                i += 1;
            }
            '}' => {
                d.close_group();
                i += 1;
            }
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    break;
                };
                if next.is_ascii_alphabetic() {
                    let start = i + 1;
                    let mut j = start;
                    while j < chars.len() && chars[j].is_ascii_alphabetic() {
                        j += 1;
                    }
                    let word: String = chars[start..j].iter().collect();

                    let param_start = j;
                    if j < chars.len() && chars[j] == '-' {
                        j += 1;
                    }
                    let digits_start = j;
                    while j < chars.len() && chars[j].is_ascii_digit() {
                        j += 1;
                    }
                    if j == digits_start {
                        j = param_start;
                    }
                    let param = if j > param_start {
                        chars[param_start..j]
                            .iter()
                            .collect::<String>()
                            .parse::<i32>()
                            .ok()
                    } else {
                        None
                    };
                    if j < chars.len() && chars[j] == ' ' {
                        j += 1;
                    }
                    d.control_word(&word, param);
                    i = j;
                } else {
                    match next {
                        '\'' => {
                            let hex: String = chars.iter().skip(i + 2).take(2).collect();
                            if hex.len() == 2 {
                                if let Ok(b) = u8::from_str_radix(&hex, 16) {
                                    d.emit_byte(b);
                                }
                            }
                            i += 2 + hex.chars().count();
                        }
                        '*' => {
                            d.state.skip = true;
                            i += 2;
                        }
                        '\\' | '{' | '}' => {
                            d.emit(next);
                            i += 2;
                        }
                        '~' => {
                            d.emit(' ');
                            i += 2;
                        }
                        '_' => {
                            d.emit('-');
                            i += 2;
                        }
                        '\n' | '\r' => {
                            d.emit('\n');
                            i += 2;
                        }
                        _ => i += 2,
                    }
                }
            }
            '\r' | '\n' => i += 1,
            c => {
                d.emit(c);
                i += 1;
            }
        }
    }
    d.flush_bytes();
    d.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paragraphs() {
        let rtf = concat!(
            r"{\rtf1\ansi\deff0 {\fonttbl {\f0 Times New Roman;}}\f0\fs24 ",
            r"End User License Agreement\par This game uses BattlEye.\par}",
        );
        assert_eq!(
            rtf_to_text(rtf),
            "End User License Agreement\nThis game uses BattlEye.\n"
        );
    }

    #[test]
    fn skips_tables_and_starred_destinations() {
        let rtf = concat!(
            r"{\rtf1{\colortbl;\red255\green0\blue0;}{\*\generator Riched20;}",
            r"{\info{\title Secret}}Visible\par}",
        );
        assert_eq!(rtf_to_text(rtf), "Visible\n");
    }

    #[test]
    fn hex_escapes_decode_as_cp1252() {
        let rtf = r"{\rtf1 caf\'e9 \'93quoted\'94}";
        assert_eq!(rtf_to_text(rtf), "café \u{201C}quoted\u{201D}");
    }

    #[test]
    fn unicode_escape_skips_fallback() {
        let rtf = r"{\rtf1\uc1\u8364?5 and \u-3913?x}";
        assert_eq!(rtf_to_text(rtf), "€5 and \u{F0B7}x");
    }

    #[test]
    fn escaped_braces_and_backslashes() {
        let rtf = r"{\rtf1 a\{b\}c\\d\tab e}";
        assert_eq!(rtf_to_text(rtf), "a{b}c\\d\te");
    }

    #[test]
    fn source_newlines_are_not_text() {
        let rtf = "{\\rtf1 first\r\nsecond\\par\nthird}";
        assert_eq!(rtf_to_text(rtf), "firstsecond\nthird");
    }

    #[test]
    fn truncated_input_does_not_panic() {
        assert_eq!(rtf_to_text(r"{\rtf1 text\'e"), "text");
        assert_eq!(rtf_to_text("\\"), "");
        assert_eq!(rtf_to_text("}}}plain"), "plain");
    }
}
