//! Pure derivation helpers for auto-populated form fields.
//!
//! Usernames, e-mail addresses and class codes are derived on the client
//! while a record is being created, then frozen once it exists. The grade
//! total mirrors the server's weighted computation as a display preview.
//!
//! Every function here is total: empty or malformed input produces an
//! empty or absent value, never an error. Required-field enforcement
//! belongs to the form layer.

/// Weight applied to the midterm component of a class grade.
pub const MIDTERM_WEIGHT: f64 = 0.3;

/// Weight applied to the final-exam component of a class grade.
pub const FINAL_WEIGHT: f64 = 0.7;

/// Number of trailing student-code characters appended to a student's
/// derived username.
pub const STUDENT_CODE_SUFFIX_LEN: usize = 4;

/// Removes Vietnamese diacritics from `text`.
///
/// Normalization order is fixed: precomposed letters are decomposed via
/// an explicit table, combining marks (U+0300..U+036F plus U+02C6) are
/// stripped, and `đ`/`Đ` map to `d`/`D`. Runs of whitespace collapse to
/// a single space and the result is trimmed. ASCII letters, digits and
/// other characters pass through unchanged.
///
/// The function is idempotent: folding already-folded text is a no-op.
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        let Some(folded) = fold_char(c) else {
            continue;
        };
        if folded.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(folded);
        }
    }
    out
}

/// Folds one character, or strips it entirely (combining marks).
fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'ạ' | 'ả' | 'ã' | 'â' | 'ầ' | 'ấ' | 'ậ' | 'ẩ' | 'ẫ' | 'ă' | 'ằ' | 'ắ'
        | 'ặ' | 'ẳ' | 'ẵ' => 'a',
        'è' | 'é' | 'ẹ' | 'ẻ' | 'ẽ' | 'ê' | 'ề' | 'ế' | 'ệ' | 'ể' | 'ễ' => 'e',
        'ì' | 'í' | 'ị' | 'ỉ' | 'ĩ' => 'i',
        'ò' | 'ó' | 'ọ' | 'ỏ' | 'õ' | 'ô' | 'ồ' | 'ố' | 'ộ' | 'ổ' | 'ỗ' | 'ơ' | 'ờ' | 'ớ'
        | 'ợ' | 'ở' | 'ỡ' => 'o',
        'ù' | 'ú' | 'ụ' | 'ủ' | 'ũ' | 'ư' | 'ừ' | 'ứ' | 'ự' | 'ử' | 'ữ' => 'u',
        'ỳ' | 'ý' | 'ỵ' | 'ỷ' | 'ỹ' => 'y',
        'đ' => 'd',
        'À' | 'Á' | 'Ạ' | 'Ả' | 'Ã' | 'Â' | 'Ầ' | 'Ấ' | 'Ậ' | 'Ẩ' | 'Ẫ' | 'Ă' | 'Ằ' | 'Ắ'
        | 'Ặ' | 'Ẳ' | 'Ẵ' => 'A',
        'È' | 'É' | 'Ẹ' | 'Ẻ' | 'Ẽ' | 'Ê' | 'Ề' | 'Ế' | 'Ệ' | 'Ể' | 'Ễ' => 'E',
        'Ì' | 'Í' | 'Ị' | 'Ỉ' | 'Ĩ' => 'I',
        'Ò' | 'Ó' | 'Ọ' | 'Ỏ' | 'Õ' | 'Ô' | 'Ồ' | 'Ố' | 'Ộ' | 'Ổ' | 'Ỗ' | 'Ơ' | 'Ờ' | 'Ớ'
        | 'Ợ' | 'Ở' | 'Ỡ' => 'O',
        'Ù' | 'Ú' | 'Ụ' | 'Ủ' | 'Ũ' | 'Ư' | 'Ừ' | 'Ứ' | 'Ự' | 'Ử' | 'Ữ' => 'U',
        'Ỳ' | 'Ý' | 'Ỵ' | 'Ỷ' | 'Ỹ' => 'Y',
        'Đ' => 'D',
        // Combining marks left over from partially decomposed input, and
        // the modifier circumflex some IMEs emit.
        '\u{0300}'..='\u{036F}' | '\u{02C6}' => return None,
        other => other,
    };
    Some(folded)
}

/// Derives a login username from a full name.
///
/// The name is folded, lowercased and reduced to `[a-z0-9]`; an optional
/// suffix (the trailing digits of a student code) is appended verbatim.
/// Deterministic in its inputs; consults no external state.
pub fn derive_username(full_name: &str, suffix: Option<&str>) -> String {
    let mut username: String = fold_diacritics(full_name)
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if let Some(suffix) = suffix {
        username.push_str(suffix);
    }
    username
}

/// The trailing characters of a student code used as a username suffix.
///
/// Codes shorter than the suffix length are used whole.
pub fn student_code_suffix(student_code: &str) -> String {
    let chars: Vec<char> = student_code.chars().collect();
    let start = chars.len().saturating_sub(STUDENT_CODE_SUFFIX_LEN);
    chars[start..].iter().collect()
}

/// Builds an institutional e-mail address for a derived username.
///
/// An empty username derives an empty address so the form's
/// required-field check fires instead of submitting `@domain`.
pub fn derive_email(username: &str, domain: &str) -> String {
    if username.is_empty() {
        return String::new();
    }
    format!("{username}@{domain}")
}

/// Derives a class code from a course code and a semester string.
///
/// The semester keeps its digits only where dots are concerned:
/// `"IT3040"` + `"2023.1"` becomes `"IT304020231"`.
pub fn derive_class_code(course_code: &str, semester: &str) -> String {
    if course_code.is_empty() || semester.is_empty() {
        return String::new();
    }
    format!("{course_code}{}", semester.replace('.', ""))
}

/// Weighted course total, rounded to one decimal place.
///
/// Returns `None` when either component is missing; the caller renders
/// an em dash rather than `0` or `NaN`. This previews the server's
/// authoritative computation.
pub fn weighted_total(midterm: Option<f64>, final_score: Option<f64>) -> Option<f64> {
    match (midterm, final_score) {
        (Some(m), Some(f)) => {
            let total = m * MIDTERM_WEIGHT + f * FINAL_WEIGHT;
            Some((total * 10.0).round() / 10.0)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_full_name() {
        assert_eq!(fold_diacritics("Nguyễn Văn Đức"), "Nguyen Van Duc");
        assert_eq!(fold_diacritics("Trần Thị Hồng Ánh"), "Tran Thi Hong Anh");
    }

    #[test]
    fn test_fold_is_idempotent() {
        let inputs = [
            "Nguyễn Văn Đức",
            "Đặng Hữu Phước",
            "plain ascii 123",
            "  lots   of   space  ",
        ];
        for input in inputs {
            let once = fold_diacritics(input);
            assert_eq!(fold_diacritics(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_fold_every_vowel_family() {
        let families = [
            ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
            ("èéẹẻẽêềếệểễ", 'e'),
            ("ìíịỉĩ", 'i'),
            ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
            ("ùúụủũưừứựửữ", 'u'),
            ("ỳýỵỷỹ", 'y'),
        ];
        for (input, base) in families {
            let folded = fold_diacritics(input);
            assert_eq!(folded.chars().count(), input.chars().count());
            assert!(folded.chars().all(|c| c == base), "{input:?} -> {folded:?}");

            let upper = fold_diacritics(&input.to_uppercase());
            assert!(upper.chars().all(|c| c == base.to_ascii_uppercase()));
        }
        assert_eq!(fold_diacritics("ĐđÀÁỲỹ"), "DdAAYy");
    }

    #[test]
    fn test_fold_strips_leftover_combining_marks() {
        // "Văn" typed as base letters plus combining marks.
        let decomposed = "Va\u{0306}n \u{0110}u\u{031B}\u{0301}c";
        assert_eq!(fold_diacritics(decomposed), "Van Duc");
    }

    #[test]
    fn test_fold_collapses_whitespace() {
        assert_eq!(fold_diacritics("  Nguyễn   Văn  "), "Nguyen Van");
        assert_eq!(fold_diacritics(""), "");
    }

    #[test]
    fn test_derive_username_plain() {
        assert_eq!(derive_username("Nguyễn Văn Đức", None), "nguyenvanduc");
    }

    #[test]
    fn test_derive_username_with_suffix() {
        let username = derive_username("Nguyễn Văn Đức", Some("0001"));
        assert_eq!(username, "nguyenvanduc0001");
        assert!(username.ends_with("0001"));
        assert!(!username.contains(char::is_whitespace));
        assert_eq!(username, username.to_lowercase());
    }

    #[test]
    fn test_derive_username_strips_punctuation() {
        assert_eq!(derive_username("O'Brien, Jr.", None), "obrienjr");
    }

    #[test]
    fn test_derive_username_empty_name() {
        assert_eq!(derive_username("", None), "");
        assert_eq!(derive_username("", Some("0001")), "0001");
    }

    #[test]
    fn test_student_code_suffix() {
        assert_eq!(student_code_suffix("20210001"), "0001");
        assert_eq!(student_code_suffix("001"), "001");
        assert_eq!(student_code_suffix(""), "");
    }

    #[test]
    fn test_derive_email() {
        assert_eq!(
            derive_email("nguyenvanduc", "hust.edu.vn"),
            "nguyenvanduc@hust.edu.vn"
        );
        assert_eq!(derive_email("", "hust.edu.vn"), "");
    }

    #[test]
    fn test_derive_class_code_strips_dots() {
        assert_eq!(derive_class_code("IT3040", "2023.1"), "IT304020231");
        assert_eq!(derive_class_code("IT3040", "2024.2"), "IT304020242");
        // Already dotless semesters pass through.
        assert_eq!(derive_class_code("MI1110", "20231"), "MI111020231");
    }

    #[test]
    fn test_derive_class_code_incomplete_inputs() {
        assert_eq!(derive_class_code("", "2023.1"), "");
        assert_eq!(derive_class_code("IT3040", ""), "");
    }

    #[test]
    fn test_weighted_total() {
        assert_eq!(weighted_total(Some(8.0), Some(6.0)), Some(6.6));
        assert_eq!(weighted_total(Some(7.0), Some(7.0)), Some(7.0));
        assert_eq!(weighted_total(Some(10.0), Some(10.0)), Some(10.0));
        assert_eq!(weighted_total(Some(0.0), Some(0.0)), Some(0.0));
    }

    #[test]
    fn test_weighted_total_rounds_to_one_decimal() {
        // 5.5 * 0.3 + 7.25 * 0.7 = 6.725 -> 6.7
        assert_eq!(weighted_total(Some(5.5), Some(7.25)), Some(6.7));
    }

    #[test]
    fn test_weighted_total_absent_component() {
        assert_eq!(weighted_total(None, Some(7.0)), None);
        assert_eq!(weighted_total(Some(7.0), None), None);
        assert_eq!(weighted_total(None, None), None);
    }
}
