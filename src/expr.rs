//! The template expression language used for bulk renames.
//!
//! A template is literal text with three kinds of escapes: `{{` for a
//! literal brace, `%%` for a literal percent sign, `%<spec><conv>` which
//! applies a C-style format specifier to the current index, and `{…}`
//! expressions:
//!
//! - `i` (or `I`) is the current index.
//! - `rand`, `rand N`, `rand MIN MAX` draw from `[0, 100)`, `[0, N)` and
//!   `[MIN, MAX)` respectively.
//! - `mul A B`, `add A B`, `sub A B`, `div A B` evaluate both arguments
//!   recursively and apply the operation on 64-bit signed integers.
//! - `a|b|c` picks one alternative by `index mod parts`, or by the value of
//!   a trailing `;i=<expr>` selector; only the chosen branch is evaluated.
//! - a trailing `;fmt=%<spec>` formats the final value.
//!
//! The evaluator never fails: anything it cannot interpret is returned as
//! the original fragment text.

use rand::Rng;

/// Expands a template for the given index.
pub fn process_expr(template: &str, index: i64) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push('{');
                i += 2;
            }
            '{' => match find_closing(&chars, i) {
                Some(end) => {
                    let inner: String = chars[i + 1..end].iter().collect();
                    out.push_str(&eval_expr(&inner, index));
                    i = end + 1;
                }
                None => {
                    out.push('{');
                    i += 1;
                }
            },
            '%' if chars.get(i + 1) == Some(&'%') => {
                out.push('%');
                i += 2;
            }
            '%' => match parse_format_spec(&chars, i + 1) {
                Some((spec, next)) => {
                    out.push_str(&apply_format(&spec, &index.to_string()));
                    i = next;
                }
                None => {
                    out.push('%');
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

// Locates the brace matching the one at `open`, respecting nesting.
fn find_closing(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn eval_expr(raw: &str, index: i64) -> String {
    let mut expr = raw.trim();

    let mut fmt = None;
    if let Some(pos) = find_at_depth0(expr, ";fmt=") {
        fmt = Some(expr[pos + 5..].trim().to_string());
        expr = expr[..pos].trim_end();
    }

    // the selector only belongs to an alternative list
    let mut selector = None;
    if contains_at_depth0(expr, b'|') {
        if let Some(pos) = find_at_depth0(expr, ";i=") {
            selector = Some(expr[pos + 3..].trim().to_string());
            expr = expr[..pos].trim_end();
        }
    }

    let parts = split_at_depth0(expr, |b| b == b'|');
    let value = if parts.len() > 1 {
        let chosen = selector
            .as_deref()
            .and_then(|sel| eval_number(sel, index))
            .unwrap_or(index);
        let pick = chosen.rem_euclid(parts.len() as i64) as usize;
        // only the chosen branch runs, so rand in other branches stays untouched
        eval_fragment(parts[pick], index)
    } else {
        eval_plain(expr, index)
    };

    match fmt {
        Some(spec) => apply_fmt(&spec, &value),
        None => value,
    }
}

fn eval_plain(expr: &str, index: i64) -> String {
    if expr == "i" || expr == "I" {
        return index.to_string();
    }
    let words = split_at_depth0(expr, |b| b == b' ' || b == b'\t');
    let result = match words.split_first() {
        Some((&"rand", args)) => eval_rand(args, index),
        Some((&op, args)) if args.len() == 2 && is_arith(op) => {
            eval_arith(op, args[0], args[1], index)
        }
        _ => None,
    };
    result.unwrap_or_else(|| expr.to_string())
}

fn is_arith(op: &str) -> bool {
    matches!(op, "mul" | "add" | "sub" | "div")
}

fn eval_rand(args: &[&str], index: i64) -> Option<String> {
    let mut rng = rand::thread_rng();
    let value = match args.len() {
        0 => rng.gen_range(0..100),
        1 => {
            let n = eval_number(args[0], index)?;
            if n <= 0 {
                0
            } else {
                rng.gen_range(0..n)
            }
        }
        2 => {
            let min = eval_number(args[0], index)?;
            let max = eval_number(args[1], index)?;
            if max <= min {
                min
            } else {
                rng.gen_range(min..max)
            }
        }
        _ => return None,
    };
    Some(value.to_string())
}

fn eval_arith(op: &str, a: &str, b: &str, index: i64) -> Option<String> {
    let a = eval_number(a, index)?;
    let b = eval_number(b, index)?;
    let value = match op {
        "mul" => a.checked_mul(b),
        "add" => a.checked_add(b),
        "sub" => a.checked_sub(b),
        "div" => a.checked_div(b),
        _ => None,
    }?;
    Some(value.to_string())
}

// Evaluates a fragment, stripping one level of braces if it carries them.
fn eval_fragment(text: &str, index: i64) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.len() >= 2 {
        eval_expr(&trimmed[1..trimmed.len() - 1], index)
    } else {
        eval_expr(trimmed, index)
    }
}

// Evaluates an argument (possibly a nested `{…}` expression) to an integer.
fn eval_number(word: &str, index: i64) -> Option<i64> {
    eval_fragment(word, index).trim().parse().ok()
}

// Finds the last occurrence of `pattern` that sits outside any nested braces.
fn find_at_depth0(expr: &str, pattern: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let pat = pattern.as_bytes();
    let mut depth = 0i32;
    let mut found = None;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            _ => {}
        }
        if depth == 0 && bytes[i..].starts_with(pat) {
            found = Some(i);
        }
    }
    found
}

fn contains_at_depth0(expr: &str, needle: u8) -> bool {
    let mut depth = 0i32;
    for &b in expr.as_bytes() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            _ if depth == 0 && b == needle => return true,
            _ => {}
        }
    }
    false
}

// Splits on separator bytes outside nested braces, dropping empty pieces
// (so runs of whitespace act as one separator).
fn split_at_depth0(expr: &str, is_sep: impl Fn(u8) -> bool) -> Vec<&str> {
    let bytes = expr.as_bytes();
    let mut depth = 0i32;
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            b if depth == 0 && is_sep(b) => {
                if i > start {
                    parts.push(&expr[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if bytes.len() > start {
        parts.push(&expr[start..]);
    }
    parts
}

#[derive(Debug, Default, Clone)]
struct FormatSpec {
    minus: bool,
    zero: bool,
    plus: bool,
    space: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

// Parses `<flags><width>[.<precision>]<conv>` starting at `start`, returning
// the spec and the position just past the conversion character.
fn parse_format_spec(chars: &[char], start: usize) -> Option<(FormatSpec, usize)> {
    let mut spec = FormatSpec::default();
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '-' => spec.minus = true,
            '0' => spec.zero = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '#' => {}
            _ => break,
        }
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        spec.width = spec.width * 10 + chars[i].to_digit(10).unwrap() as usize;
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let mut precision = 0;
        while i < chars.len() && chars[i].is_ascii_digit() {
            precision = precision * 10 + chars[i].to_digit(10).unwrap() as usize;
            i += 1;
        }
        spec.precision = Some(precision);
    }
    let conv = *chars.get(i)?;
    if !"diuxXobsc".contains(conv) {
        return None;
    }
    spec.conv = conv;
    Some((spec, i + 1))
}

// Applies a `;fmt=%<spec>` suffix to a computed value.
fn apply_fmt(spec_text: &str, value: &str) -> String {
    let chars: Vec<char> = spec_text.chars().collect();
    if chars.first() != Some(&'%') {
        return value.to_string();
    }
    match parse_format_spec(&chars, 1) {
        Some((spec, end)) if end == chars.len() => apply_format(&spec, value),
        _ => value.to_string(),
    }
}

// First as an integer, then as a string, then raw.
fn apply_format(spec: &FormatSpec, value: &str) -> String {
    match spec.conv {
        'd' | 'i' | 'u' | 'x' | 'X' | 'o' | 'b' => match value.trim().parse::<i64>() {
            Ok(num) => format_integer(spec, num),
            Err(_) => pad_string(spec, value),
        },
        's' => pad_string(spec, value),
        'c' => value.chars().next().map(|c| c.to_string()).unwrap_or_default(),
        _ => value.to_string(),
    }
}

fn format_integer(spec: &FormatSpec, num: i64) -> String {
    let magnitude = num.unsigned_abs();
    let digits = match spec.conv {
        'x' => format!("{:x}", magnitude),
        'X' => format!("{:X}", magnitude),
        'o' => format!("{:o}", magnitude),
        'b' => format!("{:b}", magnitude),
        _ => magnitude.to_string(),
    };
    let sign = if num < 0 {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    let body = sign.len() + digits.len();
    if spec.width <= body {
        return format!("{}{}", sign, digits);
    }
    let fill = spec.width - body;
    if spec.minus {
        format!("{}{}{}", sign, digits, " ".repeat(fill))
    } else if spec.zero {
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}{}", " ".repeat(fill), sign, digits)
    }
}

fn pad_string(spec: &FormatSpec, value: &str) -> String {
    let mut text = value.to_string();
    if let Some(precision) = spec.precision {
        if text.chars().count() > precision {
            text = text.chars().take(precision).collect();
        }
    }
    let len = text.chars().count();
    if spec.width <= len {
        return text;
    }
    let fill = " ".repeat(spec.width - len);
    if spec.minus {
        text + &fill
    } else {
        fill + &text
    }
}

#[cfg(test)]
mod tests {
    use super::process_expr;

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(process_expr("plain name", 3), "plain name");
        assert_eq!(process_expr("{{braced}} 100%%", 0), "{braced} 100%");
    }

    #[test]
    fn the_index_is_available_as_i() {
        assert_eq!(process_expr("{i}", 7), "7");
        assert_eq!(process_expr("user {I}", 12), "user 12");
    }

    #[test]
    fn rand_with_a_unit_range_is_deterministic() {
        assert_eq!(process_expr("{rand 1}", 0), "0");
        assert_eq!(process_expr("{rand 0}", 0), "0");
        assert_eq!(process_expr("{rand -5}", 0), "0");
    }

    #[test]
    fn rand_respects_its_bounds() {
        for _ in 0..50 {
            let value: i64 = process_expr("{rand 10}", 0).parse().unwrap();
            assert!((0..10).contains(&value));
            let value: i64 = process_expr("{rand 5 8}", 0).parse().unwrap();
            assert!((5..8).contains(&value));
        }
        // an inverted range collapses to the minimum
        assert_eq!(process_expr("{rand 9 2}", 0), "9");
    }

    #[test]
    fn format_suffixes_apply_to_the_result() {
        assert_eq!(process_expr("{rand 1;fmt=%04d}", 0), "0000");
        assert_eq!(process_expr("{i;fmt=%+d}", 3), "+3");
        assert_eq!(process_expr("{i;fmt=%x}", 255), "ff");
        assert_eq!(process_expr("{a|b;fmt=%-4s}!", 0), "a   !");
    }

    #[test]
    fn arithmetic_evaluates_recursively() {
        assert_eq!(process_expr("{add 1 1}", 0), "2");
        assert_eq!(process_expr("{add 1 {rand 0}}", 0), "1");
        assert_eq!(process_expr("{mul 6 7}", 0), "42");
        assert_eq!(process_expr("{sub 1 4}", 0), "-3");
        assert_eq!(process_expr("{div 9 2}", 0), "4");
        assert_eq!(process_expr("{mul {add 2 3} {i}}", 4), "20");
    }

    #[test]
    fn failures_return_the_fragment_unchanged() {
        assert_eq!(process_expr("{add one two}", 0), "add one two");
        assert_eq!(process_expr("{div 1 0}", 0), "div 1 0");
        assert_eq!(process_expr("{something else}", 0), "something else");
        assert_eq!(process_expr("{unclosed", 0), "{unclosed");
    }

    #[test]
    fn alternatives_pick_by_index() {
        assert_eq!(process_expr("{a|b}", 0), "a");
        assert_eq!(process_expr("{a|b}", 1), "b");
        assert_eq!(process_expr("{a|b}", 2), "a");
        assert_eq!(process_expr("{a|b|c}", 5), "c");
    }

    #[test]
    fn alternatives_honor_an_explicit_selector() {
        assert_eq!(process_expr("{a|b;i=1}", 0), "b");
        assert_eq!(process_expr("{a|b|c;i={add 1 1}}", 0), "c");
    }

    #[test]
    fn chosen_branches_evaluate_recursively() {
        assert_eq!(process_expr("{first|{add 2 2}}", 1), "4");
        assert_eq!(process_expr("{first|{add 2 2}}", 0), "first");
    }

    #[test]
    fn percent_specs_format_the_index() {
        assert_eq!(process_expr("member %03d", 7), "member 007");
        assert_eq!(process_expr("%-4d|", 42), "42  |");
        assert_eq!(process_expr("%s.", 9), "9.");
    }
}
