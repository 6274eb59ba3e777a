//! Shared utilities for devgrep.

/// Length of the value at the start of `s`: a quoted run up to its closing
/// quote (or the rest of the line if unterminated), else up to whitespace.
fn value_end(s: &str) -> usize {
    match s.chars().next() {
        Some(q @ ('"' | '\'')) => s[1..].find(q).map_or(s.len(), |i| i + 2),
        _ => s.find(char::is_whitespace).unwrap_or(s.len()),
    }
}

/// Keywords whose following value is masked. Matched case-insensitively.
const SENSITIVE_KEYWORDS: &[&str] = &[
    "password ",
    "password=",
    "secret ",
    "secret=",
    "community ",
    "key-string ",
    "pre-shared-key ",
    "token ",
    "token=",
];

/// Mask credentials in a device command before logging.
///
/// Device CLIs carry secrets inline (`username x password y`,
/// `snmp-server community z`); the value after each keyword becomes `***`.
pub fn mask_sensitive_command(cmd: &str) -> String {
    let mut result = cmd.to_string();
    for keyword in SENSITIVE_KEYWORDS {
        let mut search_start = 0;
        while search_start < result.len() {
            let lower = result[search_start..].to_ascii_lowercase();
            let Some(start) = lower.find(keyword) else {
                break;
            };
            let value_start = search_start + start + keyword.len();
            let end = value_start + value_end(&result[value_start..]);

            if end == value_start {
                search_start = value_start;
                continue;
            }

            result.replace_range(value_start..end, "***");
            search_start = value_start + "***".len();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_command() {
        let cmd = "username admin privilege 15 password hunter2";
        let masked = mask_sensitive_command(cmd);
        assert_eq!(masked, "username admin privilege 15 password ***");

        let masked = mask_sensitive_command("snmp-server community s3cret RO");
        assert_eq!(masked, "snmp-server community *** RO");
        assert!(!masked.contains("s3cret"));
    }

    #[test]
    fn test_mask_sensitive_command_case_insensitive() {
        let masked = mask_sensitive_command("enable SECRET topsecret");
        assert_eq!(masked, "enable SECRET ***");
    }

    #[test]
    fn test_mask_sensitive_command_multiple() {
        let cmd = "token=a token=b";
        let masked = mask_sensitive_command(cmd);
        assert_eq!(masked, "token=*** token=***");
    }

    #[test]
    fn test_mask_sensitive_command_quoted() {
        let cmd = "set system login password=\"my super secret\" --other";
        let masked = mask_sensitive_command(cmd);
        assert_eq!(masked, "set system login password=*** --other");
        assert!(!masked.contains("super"));
    }

    #[test]
    fn test_mask_sensitive_command_unterminated_quote() {
        let masked = mask_sensitive_command("username ops secret 'never closed");
        assert_eq!(masked, "username ops secret ***");
    }

    #[test]
    fn test_mask_sensitive_command_single_quoted_then_more() {
        let masked = mask_sensitive_command("key-string 'a b' community c RW");
        assert_eq!(masked, "key-string *** community *** RW");
    }

    #[test]
    fn test_plain_show_commands_untouched() {
        for cmd in ["show run", "show ip int brief", "show run | include password"] {
            assert_eq!(mask_sensitive_command(cmd), cmd);
        }
    }
}
