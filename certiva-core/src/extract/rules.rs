//! Anchored pattern rules for certificate fields.
//!
//! Each rule targets one field and is anchored to the layout conventions
//! of printed certificates: the institute header sits in the first few
//! lines, the student name follows an award phrase, dates and
//! registration numbers follow their labels. Rules never guess - a field
//! the rules cannot anchor stays `None` for the generative fallback.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::CertificateFields;

/// Phrases that precede the student name on most certificates.
const NAME_KEYWORDS: [&str; 5] = [
    "certifies that",
    "awarded to",
    "student name",
    "conferred upon",
    "presented to",
];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static INSTITUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:university|institute|college|academy)\b").expect("valid regex")
});

static ALL_CAPS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\s.]+$").expect("valid regex"));

static TITLE_CASE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+(?:\s[A-Z][a-z.]+)+$").expect("valid regex"));

static DEGREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Bachelor|Master|Doctor)\s+of\s+[A-Za-z ]+").expect("valid regex")
});

static MAJOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:major in|specialization in|field of|in)\s+([A-Za-z][A-Za-z ,]*)")
        .expect("valid regex")
});

static CERT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Reg(?:istration)?\.?\s*No\.?|Roll\s*No\.?|Student\s*ID|Enroll(?:ment)?\.?\s*No\.?|Certificate\s*(?:ID|No\.?))\s*[:\-]?\s*([A-Z0-9/-]+)",
    )
    .expect("valid regex")
});

/// Date patterns in priority order: numeric, day-first worded, month-first
/// worded. The first pattern whose first match parses to a real date wins.
static DATE_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").expect("valid regex"));

static DATE_DAY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s+([A-Za-z]+)\s+(\d{2,4})\b").expect("valid regex"));

static DATE_MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})\b").expect("valid regex"));

/// Run every pattern rule over the (already cleaned) document text.
pub fn extract_with_rules(text: &str) -> CertificateFields {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| WHITESPACE_RE.replace_all(l, " ").into_owned())
        .collect();

    let mut fields = CertificateFields::default();

    // Institute header: first of the first five lines naming an institution.
    fields.institute_name = lines
        .iter()
        .take(5)
        .find(|line| INSTITUTE_RE.is_match(line))
        .cloned();

    fields.student_name = find_student_name(&lines);

    fields.degree = DEGREE_RE
        .find(text)
        .map(|m| title_case(m.as_str().trim()));

    fields.major = MAJOR_RE
        .captures(text)
        .map(|c| title_case(c[1].trim().trim_end_matches([',', ' '])));

    fields.certificate_id = CERT_ID_RE.captures(text).map(|c| c[1].trim().to_string());

    fields.date_of_issue = parse_issue_date(text);

    fields
}

/// Scan for an award phrase, then accept the phrase line or the following
/// line only if it is name-shaped (all-caps or Title-Case multi-word).
fn find_student_name(lines: &[String]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !NAME_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        for candidate in lines.iter().skip(i).take(2) {
            if ALL_CAPS_NAME_RE.is_match(candidate) || TITLE_CASE_NAME_RE.is_match(candidate) {
                return Some(title_case(candidate));
            }
        }
    }
    None
}

/// Try each date pattern in priority order against its first match in the
/// text; stop at the first pattern that parses successfully.
fn parse_issue_date(text: &str) -> Option<String> {
    if let Some(caps) = DATE_NUMERIC_RE.captures(text) {
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let year = fix_year(caps[3].parse().ok()?);

        // Day-first disambiguation: day/month order, then month/day.
        let parsed = NaiveDate::from_ymd_opt(year, b, a)
            .or_else(|| NaiveDate::from_ymd_opt(year, a, b));
        if let Some(date) = parsed {
            return Some(format_issue_date(date));
        }
    }

    if let Some(caps) = DATE_DAY_MONTH_RE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let year = fix_year(caps[3].parse().ok()?);
        if let Some(month) = month_number(&caps[2]) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(format_issue_date(date));
            }
        }
    }

    if let Some(caps) = DATE_MONTH_DAY_RE.captures(text) {
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if let Some(month) = month_number(&caps[1]) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(format_issue_date(date));
            }
        }
    }

    None
}

/// Canonical presentation format: `DD Month YYYY`.
fn format_issue_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// Resolve two-digit years: below 50 lands in the 2000s, the rest in the
/// 1900s.
fn fix_year(year: i32) -> i32 {
    if year < 50 {
        2000 + year
    } else if year < 100 {
        1900 + year
    } else {
        year
    }
}

/// Month from an English name or three-letter abbreviation.
fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
RIVERSIDE STATE UNIVERSITY
School of Engineering
This certifies that
JOHN ALBERT DOE
has successfully completed the degree of
Bachelor of Science
major in Computer Science
Reg. No: RSU-2022-0042
Awarded on 12/09/2022";

    #[test]
    fn test_full_sample_extraction() {
        let fields = extract_with_rules(SAMPLE);
        assert_eq!(
            fields.institute_name.as_deref(),
            Some("RIVERSIDE STATE UNIVERSITY")
        );
        assert_eq!(fields.student_name.as_deref(), Some("John Albert Doe"));
        assert_eq!(fields.degree.as_deref(), Some("Bachelor Of Science"));
        assert_eq!(fields.major.as_deref(), Some("Computer Science"));
        assert_eq!(fields.certificate_id.as_deref(), Some("RSU-2022-0042"));
        assert_eq!(fields.date_of_issue.as_deref(), Some("12 September 2022"));
    }

    #[test]
    fn test_institute_only_in_first_five_lines() {
        let text = "line one\nline two\nline three\nline four\nline five\nGreendale College";
        let fields = extract_with_rules(text);
        assert_eq!(fields.institute_name, None);
    }

    #[test]
    fn test_title_case_name_accepted() {
        let text = "Awarded to\nJane Mary Smith\nfor excellence";
        let fields = extract_with_rules(text);
        assert_eq!(fields.student_name.as_deref(), Some("Jane Mary Smith"));
    }

    #[test]
    fn test_non_name_shaped_candidate_rejected() {
        let text = "This is awarded to\nthe bearer of this document";
        let fields = extract_with_rules(text);
        assert_eq!(fields.student_name, None);
    }

    #[test]
    fn test_no_date_leaves_field_empty() {
        let fields = extract_with_rules("No recognizable calendar reference here");
        assert_eq!(fields.date_of_issue, None);
    }

    #[test]
    fn test_unparsable_numeric_date_falls_through_to_worded() {
        // 31/02 is invalid in either day/month order, so the numeric
        // pattern fails and the worded pattern wins.
        let text = "Drafted 31/02/2021 and issued 5 March 2021";
        let fields = extract_with_rules(text);
        assert_eq!(fields.date_of_issue.as_deref(), Some("05 March 2021"));
    }

    #[test]
    fn test_month_first_date() {
        let fields = extract_with_rules("Issued September 12, 2022");
        assert_eq!(fields.date_of_issue.as_deref(), Some("12 September 2022"));
    }

    #[test]
    fn test_day_first_disambiguation() {
        // 05/03 is ambiguous; day-first order wins.
        let fields = extract_with_rules("Dated 05/03/2021");
        assert_eq!(fields.date_of_issue.as_deref(), Some("05 March 2021"));
    }

    #[test]
    fn test_two_digit_year_resolution() {
        let fields = extract_with_rules("Dated 12-09-22");
        assert_eq!(fields.date_of_issue.as_deref(), Some("12 September 2022"));

        let fields = extract_with_rules("Dated 12-09-98");
        assert_eq!(fields.date_of_issue.as_deref(), Some("12 September 1998"));
    }

    #[test]
    fn test_certificate_id_variants() {
        for text in [
            "Registration No: AB-123",
            "Roll No. AB-123",
            "Student ID: AB-123",
            "Enrollment No - AB-123",
            "Certificate ID AB-123",
        ] {
            let fields = extract_with_rules(text);
            assert_eq!(fields.certificate_id.as_deref(), Some("AB-123"), "{text}");
        }
    }

    #[test]
    fn test_month_abbreviations() {
        assert_eq!(month_number("September"), Some(9));
        assert_eq!(month_number("sep"), Some(9));
        assert_eq!(month_number("JAN"), Some(1));
        assert_eq!(month_number("sept"), None);
        assert_eq!(month_number("notamonth"), None);
    }
}
