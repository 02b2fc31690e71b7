//! Logfmt decoding: `key=value key="quoted value" bare`.
//!
//! The decoder is deliberately forgiving. It never fails; text it cannot make
//! sense of is skipped or kept as literal characters.

/// Decode `text` into key/value pairs, in the order they appear.
///
/// - pairs are separated by whitespace;
/// - a key runs until `=` or whitespace and may itself be double-quoted;
/// - a key with no `=` yields an empty value;
/// - an unquoted value runs until whitespace;
/// - a quoted value runs to the next unescaped `"`, understanding `\"`, `\'`,
///   `\\`, `\n` and `\t`. An unterminated quote takes the rest of the text.
pub fn decode(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        let key = if first == '"' {
            chars.next();
            read_quoted(&mut chars)
        } else {
            let mut key = String::new();
            while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
                key.push(c);
            }
            key
        };

        let value = if chars.next_if_eq(&'=').is_some() {
            if chars.next_if_eq(&'"').is_some() {
                read_quoted(&mut chars)
            } else {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
                value
            }
        } else {
            String::new()
        };

        if !key.is_empty() {
            pairs.push((key, value));
        }
    }

    pairs
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\'') => out.push('\''),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}
