// `input text` only handles printable ASCII; anything else goes through the
// ADB Keyboard IME broadcast.
use base64::Engine as _;

/// Broadcast action understood by the ADB Keyboard IME.
pub const ADB_KEYBOARD_B64_ACTION: &str = "ADB_INPUT_B64";

/// Returns true if `input text` cannot type this segment. `%` counts because
/// `input text` reads `%s` as a space.
pub fn requires_ime(text: &str) -> bool {
    text.chars().any(|c| !c.is_ascii() || c.is_ascii_control() || c == '%')
}

/// Escape ASCII text for `adb shell input text`, which runs through the
/// device shell and reads `%s` as a space.
pub fn escape_for_input_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            ' ' => out.push_str("%s"),
            '\\' | '\'' | '"' | '`' | '$' | '&' | '|' | ';' | '<' | '>' | '(' | ')' | '*'
            | '?' | '~' | '#' | '!' | '[' | ']' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Payload for `am broadcast -a ADB_INPUT_B64 --es msg <payload>`.
pub fn encode_for_adb_keyboard(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}
