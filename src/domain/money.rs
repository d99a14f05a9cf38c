use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point drift.
/// For EUR/USD, 1 unit = 100 cents, so 50.00 = 5000 cents.
///
/// Comparisons between split totals and expense totals are exact: a one-cent
/// tolerance in currency terms is zero once everything is whole cents.
pub type Cents = i64;

/// Percentages are stored in hundredths of a percent, so 100% = 10_000.
pub type BasisPoints = i64;

pub const FULL_PERCENTAGE: BasisPoints = 10_000;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Percentages share the two-decimal layout of cents.
pub fn format_percentage(bp: BasisPoints) -> String {
    format!("{}%", format_cents(bp))
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units, decimals) = match input.split_once('.') {
        Some((units, decimals)) => (units, Some(decimals)),
        None => (input, None),
    };

    // Digits only: no second sign, no '+'
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(units) || !decimals.is_none_or(all_digits) {
        return Err(ParseCentsError::InvalidFormat);
    }
    if units.is_empty() && decimals.is_none_or(str::is_empty) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units.is_empty() {
        0
    } else {
        units.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    // Pad to two digits, truncate anything past the cent
    let decimal_cents: i64 = match decimals {
        None | Some("") => 0,
        Some(d) if d.len() == 1 => {
            d.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10
        }
        Some(d) => d[..2].parse().map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Parse a percentage like "33.33" or "50%" into basis points.
pub fn parse_percentage(input: &str) -> Result<BasisPoints, ParseCentsError> {
    parse_cents(input.trim().trim_end_matches('%'))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,

    #[error("amount is too large")]
    Overflow,
}

/// Split `total` into `count` parts that sum exactly to `total`.
/// Leftover cents go one each to the first parts.
pub fn allocate_equal(total: Cents, count: usize) -> Vec<Cents> {
    if count == 0 {
        return Vec::new();
    }
    let count_i = count as i64;
    let base = total / count_i;
    let extra = (total % count_i) as usize;

    (0..count)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Split `total` proportionally to `weights` using the largest remainder method.
///
/// Every part is first rounded down, then the missing cents go to the parts
/// with the largest fractional remainders. Equal remainders favour the earlier
/// part. The result always sums to `total` when the weights sum to a positive
/// number.
pub fn allocate_weighted(total: Cents, weights: &[i64]) -> Vec<Cents> {
    let weight_sum: i128 = weights.iter().map(|w| *w as i128).sum();
    if weights.is_empty() || weight_sum <= 0 {
        return vec![0; weights.len()];
    }

    let total_wide = total as i128;
    let mut parts: Vec<Cents> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(weights.len());

    for (index, weight) in weights.iter().enumerate() {
        let exact = total_wide * (*weight as i128);
        parts.push((exact / weight_sum) as Cents);
        remainders.push((index, exact % weight_sum));
    }

    let allocated: Cents = parts.iter().sum();
    let missing = (total - allocated) as usize;

    // Stable sort keeps earlier parts ahead on equal remainders
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    for (index, _) in remainders.into_iter().take(missing) {
        parts[index] += 1;
    }

    parts
}
