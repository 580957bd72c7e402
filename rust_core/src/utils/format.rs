//! Display helpers for prices, countdowns and round labels.

/// Seconds as `HH:MM:SS` (hours are not wrapped at 24)
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Price at token precision (`0.0550`)
pub fn format_price(price: f64) -> String {
    format!("{:.4}", price)
}

/// Whole number with thousands separators (`1,234,567`)
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

/// Fee as a percentage with two decimals: 0.5 -> `0.50%`
pub fn format_fee_rate(rate_pct: f64) -> String {
    format!("{:.2}%", rate_pct)
}

/// `"3 / 60"`, or `"Not Started"` before the first round
pub fn format_round(current_round: i64, number_of_rounds: u16) -> String {
    if current_round >= 0 {
        format!("{} / {}", current_round, number_of_rounds)
    } else {
        "Not Started".to_string()
    }
}
