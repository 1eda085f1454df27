//! Money values in OCR text: `87,300.06`, `USD 87,300.06`, `฿1 250.00`.

use std::sync::OnceLock;

use regex::Regex;

// A value must end in exactly two decimals; the caller rejects a match that
// runs straight into another digit.
const NUMBER: &str = r"((?:\d{1,3}[\s,]*)+\.\d{2})";
const CURRENCY: &str = r"(?:[A-Z]{3}|[ก-ฮ]{3}|[฿$])";

fn optional_currency() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"{CURRENCY}?[\s.]*{NUMBER}")).expect("valid regex"))
}

fn required_currency() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"{CURRENCY}[\s.]*{NUMBER}")).expect("valid regex"))
}

/// Strip spaces and thousands separators: `87, 300.06` -> `87300.06`.
pub fn clean_value(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != ',').collect()
}

fn scan(re: &Regex, text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let whole = caps.get(0).map_or(pos..pos, |m| m.range());
        let Some(number) = caps.get(1) else {
            break;
        };
        let next_is_digit = text[number.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if next_is_digit {
            // `1.234.56`: retry one character further on so `234.56` can still match.
            let step = text[whole.start..].chars().next().map_or(1, char::len_utf8);
            pos = whole.start + step;
            continue;
        }
        values.push(clean_value(number.as_str()));
        pos = whole.end.max(whole.start + 1);
    }
    values
}

/// Every money value in `text`, in order, optionally prefixed by a currency.
pub fn money_values(text: &str) -> Vec<String> {
    scan(optional_currency(), text)
}

/// Money values that directly follow a currency marker (ISO code, Thai
/// abbreviation, `฿` or `$`).
pub fn currency_values(text: &str) -> Vec<String> {
    scan(required_currency(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_values_in_order() {
        let text = "Bill Amount : USD   87,215.55\nSwift : USD 30.00\nTotal Debited : USD 87,300.06";
        assert_eq!(money_values(text), vec!["87215.55", "30.00", "87300.06"]);
    }

    #[test]
    fn test_value_followed_by_digit_is_rejected() {
        assert_eq!(money_values("rate 1.290150000"), Vec::<String>::new());
        assert_eq!(money_values("x 1.234.56 y"), vec!["234.56"]);
    }

    #[test]
    fn test_currency_values_require_marker() {
        let text = "Courier USD 32.00\nplain 99.00\nSGD170,359.40\n฿ 1,250.00";
        assert_eq!(currency_values(text), vec!["32.00", "170359.40", "1250.00"]);
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("87, 300.06"), "87300.06");
        assert_eq!(clean_value("1 000 000.00"), "1000000.00");
    }
}
