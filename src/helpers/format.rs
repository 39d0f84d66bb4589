use std::time::Duration;

pub fn format_number(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (index, ch) in raw.chars().rev().enumerate() {
        if index > 0 && index % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

pub fn format_optional_number(value: Option<u64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

pub fn format_millis(value: Option<u64>) -> String {
    match value {
        None => "-".to_string(),
        Some(ms) if ms < 1_000 => format!("{ms} ms"),
        Some(ms) => format!("{:.2} s", Duration::from_millis(ms).as_secs_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(50_000), "50,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_optional_number(None), "-");
    }

    #[test]
    fn millis_switch_to_seconds() {
        assert_eq!(format_millis(Some(420)), "420 ms");
        assert_eq!(format_millis(Some(1_500)), "1.50 s");
        assert_eq!(format_millis(None), "-");
    }
}
