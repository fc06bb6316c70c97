use std::collections::HashMap;
use std::hash::Hash;

/// Parse a locale-formatted amount cell: dots group thousands, the comma
/// is the decimal separator. Blank cells and unparseable garbage become
/// 0.0 so a single bad cell never aborts an import.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return 0.0;
    }
    let s = s.replace('.', "").replace(',', ".");
    s.parse().unwrap_or(0.0)
}

/// Normalize a header for fuzzy matching: lowercase, fold umlauts and
/// sharp-s to their ASCII digraphs, treat `/` and `-` as spaces, collapse
/// repeated whitespace.
pub fn normalize_header(s: &str) -> String {
    let s = s.trim().to_lowercase();
    let s = s
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss");
    let s = s.replace(['/', '-'], " ");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve semantic field keys to column indices by substring match of
/// normalized needles against normalized headers.
///
/// Needle order is a contract: a more specific needle ("gesamtkosten ohne
/// erstattung") must come before any needle that is a substring of it
/// ("gesamtkosten"). Each key takes the first needle that matches an
/// unclaimed column, and a claimed column is never handed to a later
/// needle, so the general needle cannot steal the specific column.
pub fn resolve_columns<K>(needles: &[(&str, K)], headers: &[String]) -> HashMap<K, usize>
where
    K: Copy + Eq + Hash,
{
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut claimed = vec![false; headers.len()];
    let mut resolved: HashMap<K, usize> = HashMap::new();

    for (needle, key) in needles {
        if resolved.contains_key(key) {
            continue;
        }
        let n = normalize_header(needle);
        let hit = normalized
            .iter()
            .enumerate()
            .find(|(i, h)| !claimed[*i] && h.contains(&n));
        if let Some((idx, _)) = hit {
            claimed[idx] = true;
            resolved.insert(*key, idx);
        }
    }
    resolved
}
