pub fn pad<S: AsRef<str>>(s: S, pad: usize) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len() + pad * 2);
    for _ in 0..pad {
        out.push(' ');
    }
    out.push_str(s);
    for _ in 0..pad {
        out.push(' ');
    }
    out
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim(),
        "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON"
    )
}

pub fn is_falsy(value: &str) -> bool {
    matches!(
        value.trim(),
        "0" | "false" | "FALSE" | "no" | "NO" | "off" | "OFF"
    )
}
