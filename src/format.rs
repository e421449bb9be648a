//! printf-style substitution of record parameters into a message.
//!
//! Directives follow `%[index$][flags][width][.precision]conversion` with the
//! conversions `s S d x X o f e b c n %` and the flags `-`, `0` and `+`.
//! A directive that has no argument, or whose argument cannot be converted,
//! is copied into the output unchanged. Surplus arguments are ignored.

use serde_json::Value;

use crate::record::Param;

const CONVERSIONS: &str = "sSdxXofebcn%";
const DEFAULT_FLOAT_PRECISION: usize = 6;

pub fn substitute(template: &str, args: &[Param]) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut next_arg = 0usize;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let Some((directive, consumed)) = Directive::parse(&chars[i + 1..]) else {
            out.push('%');
            i += 1;
            continue;
        };
        let end = i + 1 + consumed;

        match directive.conversion {
            '%' => out.push('%'),
            'n' => out.push('\n'),
            _ => {
                let index = directive.index.unwrap_or_else(|| {
                    let n = next_arg;
                    next_arg += 1;
                    n
                });
                match args.get(index).and_then(|arg| directive.render(arg)) {
                    Some(text) => out.push_str(&text),
                    None => out.extend(&chars[i..end]),
                }
            }
        }
        i = end;
    }

    out
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    left: bool,
    zero: bool,
    plus: bool,
}

#[derive(Debug)]
struct Directive {
    index: Option<usize>,
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

fn take_number(rest: &[char], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    while rest.get(*pos).is_some_and(|c| c.is_ascii_digit()) {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    rest[start..*pos].iter().collect::<String>().parse().ok()
}

impl Directive {
    /// Parse the directive that follows a `%`. Returns the directive and the
    /// number of characters it spans, or `None` when malformed.
    fn parse(rest: &[char]) -> Option<(Directive, usize)> {
        let mut pos = 0;
        let mut index = None;

        let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 && rest.get(digits) == Some(&'$') {
            let n = take_number(rest, &mut pos)?;
            if n == 0 {
                return None;
            }
            index = Some(n - 1);
            pos += 1;
        }

        let mut flags = Flags::default();
        while let Some(c) = rest.get(pos) {
            match c {
                '-' => flags.left = true,
                '0' => flags.zero = true,
                '+' => flags.plus = true,
                _ => break,
            }
            pos += 1;
        }

        let width = take_number(rest, &mut pos);

        let mut precision = None;
        if rest.get(pos) == Some(&'.') {
            pos += 1;
            precision = Some(take_number(rest, &mut pos)?);
        }

        let conversion = *rest.get(pos)?;
        if !CONVERSIONS.contains(conversion) {
            return None;
        }
        pos += 1;

        Some((
            Directive {
                index,
                flags,
                width,
                precision,
                conversion,
            },
            pos,
        ))
    }

    fn render(&self, arg: &Param) -> Option<String> {
        let numeric = matches!(self.conversion, 'd' | 'x' | 'X' | 'o' | 'f' | 'e');
        let body = match self.conversion {
            's' | 'S' => {
                let mut text = arg.display_value();
                if let Some(p) = self.precision {
                    text = text.chars().take(p).collect();
                }
                if self.conversion == 'S' {
                    text = text.to_uppercase();
                }
                text
            }
            'd' => self.signed(integer(&arg.value)?.to_string(), integer(&arg.value)? >= 0),
            'x' => format!("{:x}", bits64(integer(&arg.value)?)),
            'X' => format!("{:X}", bits64(integer(&arg.value)?)),
            'o' => format!("{:o}", bits64(integer(&arg.value)?)),
            'f' => {
                let v = arg.value.as_f64()?;
                let p = self.precision.unwrap_or(DEFAULT_FLOAT_PRECISION);
                self.signed(format!("{:.*}", p, v), v >= 0.0)
            }
            'e' => {
                let v = arg.value.as_f64()?;
                let p = self.precision.unwrap_or(DEFAULT_FLOAT_PRECISION);
                self.signed(scientific(v, p), v >= 0.0)
            }
            'b' => match &arg.value {
                Value::Bool(b) => b.to_string(),
                Value::Null => "false".to_string(),
                _ => "true".to_string(),
            },
            'c' => match &arg.value {
                Value::String(s) if s.chars().count() == 1 => s.clone(),
                Value::Number(n) => char::from_u32(u32::try_from(n.as_u64()?).ok()?)?.to_string(),
                _ => return None,
            },
            _ => return None,
        };

        Some(self.pad(body, numeric))
    }

    fn signed(&self, text: String, non_negative: bool) -> String {
        if self.flags.plus && non_negative {
            format!("+{}", text)
        } else {
            text
        }
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let len = body.chars().count();
        let Some(width) = self.width.filter(|w| *w > len) else {
            return body;
        };
        let fill = width - len;

        if self.flags.left {
            format!("{}{}", body, " ".repeat(fill))
        } else if self.flags.zero && numeric {
            let (sign, digits) = match body.chars().next() {
                Some(c @ ('-' | '+')) => (c.to_string(), &body[1..]),
                _ => (String::new(), body.as_str()),
            };
            format!("{}{}{}", sign, "0".repeat(fill), digits)
        } else {
            format!("{}{}", " ".repeat(fill), body)
        }
    }
}

/// Integral JSON number, widened so the whole `u64` range keeps its value.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        _ => None,
    }
}

/// Unsigned 64-bit view for the radix conversions, so negatives print as
/// their two's complement like a C `long` does.
fn bits64(v: i128) -> u64 {
    if v < 0 {
        v as i64 as u64
    } else {
        v as u64
    }
}

/// `1.5e2` rendered the way C and Java do: `1.500000e+02`.
fn scientific(v: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, v);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}
