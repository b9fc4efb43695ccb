//! テキスト処理ユーティリティ。
//!
//! 作家名の正規化と展覧会タイトルの整形を提供します。

/// 作家名を正規化する（前後の空白を除去し、小文字化）。
///
/// 空白やケースの揺れによる同一作家の重複を防ぐために使用します。
/// 正規化済みの名前に再適用しても結果は変わりません。
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 展覧会タイトルを整形する。空白のみの場合は `None`。
#[must_use]
pub fn clean_title(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  Pablo Picasso ", "pablo picasso")]
    #[case("HENRI MATISSE", "henri matisse")]
    #[case("\tÉdouard Vuillard\n", "édouard vuillard")]
    #[case("   ", "")]
    fn normalize_name_trims_and_folds_case(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(raw), expected);
    }

    #[test]
    fn normalize_name_is_idempotent() {
        let once = normalize_name("jane doe");
        assert_eq!(once, "jane doe");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn clean_title_rejects_blank() {
        assert_eq!(clean_title("  Cubism and Abstract Art "), Some("Cubism and Abstract Art"));
        assert_eq!(clean_title(" \t "), None);
    }
}
