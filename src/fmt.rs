/// Format a float as a rupee amount with Indian digit grouping: ₹12,34,567.89
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    // Last three digits form one group, everything above groups by two.
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i == 3 || (i > 3 && i % 2 == 1) {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    // "-0.00" after rounding is just zero
    if negative && cents != "0.00" {
        format!("-\u{20b9}{with_commas}.{dec_part}")
    } else {
        format!("\u{20b9}{with_commas}.{dec_part}")
    }
}

/// Share of `part` in `whole` as a percentage, 0 when `whole` is zero.
pub fn pct(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
