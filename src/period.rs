/// German three-letter month abbreviations, plus the ASCII spellings
/// that show up in exports ("mae"/"mar" for März).
const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("feb", 2),
    ("mär", 3),
    ("mae", 3),
    ("mar", 3),
    ("apr", 4),
    ("mai", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("dez", 12),
];

/// The banner line carries the reporting period in its 4th `;`-field.
pub fn extract_from_banner(line: &str) -> Option<String> {
    let token = line.split(';').nth(3)?;
    parse_period_token(token)
}

/// Parse a free-form period token into canonical "YYYY-MM".
///
/// Accepted shapes, tried in order: "YYYY-MM", "M.YYYY"/"MM.YYYY"
/// (month 1-12), and "<month abbreviation> <year>" with a 2- or 4-digit
/// year (2-digit years are 2000-based).
pub fn parse_period_token(token: &str) -> Option<String> {
    let s = token.trim();

    if let Some((year, month)) = s.split_once('-') {
        if year.len() == 4 && month.len() == 2 && is_digits(year) && is_digits(month) {
            return Some(format!("{year}-{month}"));
        }
    }

    if let Some((month, year)) = s.split_once('.') {
        if (1..=2).contains(&month.len()) && year.len() == 4 && is_digits(month) && is_digits(year)
        {
            let m: u32 = month.parse().ok()?;
            if (1..=12).contains(&m) {
                return Some(format!("{year}-{m:02}"));
            }
        }
    }

    let lower = s.to_lowercase();
    let parts: Vec<&str> = lower.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }
    let key: String = parts[0].chars().take(3).collect();
    let month = MONTHS
        .iter()
        .find(|(abbr, _)| *abbr == key)
        .map(|(_, m)| *m)?;
    let year = parts[1];
    if !is_digits(year) {
        return None;
    }
    match year.len() {
        2 => Some(format!("20{year}-{month:02}")),
        4 => Some(format!("{year}-{month:02}")),
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
