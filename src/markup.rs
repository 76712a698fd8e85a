/// Wrap a hosted image URL in a BBCode image tag.
pub fn bbcode(url: &str) -> String {
    format!("[img]{url}[/img]")
}

pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbcode_wraps_url() {
        assert_eq!(
            bbcode("https://i.host/a.jpg"),
            "[img]https://i.host/a.jpg[/img]"
        );
    }

    #[test]
    fn test_bbcode_does_not_escape() {
        assert_eq!(bbcode(""), "[img][/img]");
        assert_eq!(bbcode("[img]x[/img]"), "[img][img]x[/img][/img]");
    }

    #[test]
    fn test_join_lines() {
        let lines = vec![bbcode("a"), bbcode("b")];
        assert_eq!(join_lines(&lines), "[img]a[/img]\n[img]b[/img]");
        assert_eq!(join_lines(&[]), "");
    }
}
