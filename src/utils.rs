#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello world", 5), "hello");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate("Überfachliche Grundlagen", 4), "Über");
    }

    #[test]
    fn test_safe_truncate_shorter() {
        assert_eq!(safe_truncate("hi", 10), "hi");
    }
}
