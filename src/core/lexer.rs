//! Tokenizer for classifier rule lines
//!
//! Whitespace and commas separate tokens. Keywords of all three rule styles
//! (filter, lookup and director) get their own variant; everything else is a
//! [`Token::Word`] borrowed from the line.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n,]+")]
pub enum Token<'a> {
    // Filter actions
    #[token("allow")]
    Allow,
    #[token("drop")]
    Drop,
    #[token("deny")]
    Deny,

    // Classifier clauses
    #[token("src")]
    Src,
    #[token("dst")]
    Dst,
    #[token("host")]
    Host,
    #[token("net")]
    Net,
    #[token("port")]
    Port,
    #[token("ip")]
    Ip,
    #[token("proto")]
    Proto,
    #[token("ip6")]
    Ip6,
    #[token("tcp")]
    Tcp,
    #[token("udp")]
    Udp,
    #[token("mask")]
    Mask,

    // Flow-table directives
    #[token("flow")]
    Flow,
    #[token("create")]
    Create,
    #[token("group")]
    Group,
    #[token("ingress")]
    Ingress,
    #[token("egress")]
    Egress,
    #[token("transfer")]
    Transfer,
    #[token("pattern")]
    Pattern,
    #[token("actions")]
    Actions,
    #[token("end")]
    End,
    // one-character literals tie with `Word` unless lifted
    #[token("/", priority = 3)]
    Slash,
    #[token("eth")]
    Eth,
    #[token("ipv4")]
    Ipv4,
    #[token("ipv6")]
    Ipv6,
    #[token("is")]
    Is,
    #[token("spec")]
    Spec,

    #[regex(r"[^ \t\r\n,]+")]
    Word(&'a str),
}

impl<'a> Token<'a> {
    /// Tokens that mark a line as using IPv6.
    pub const fn is_ipv6_marker(&self) -> bool {
        matches!(self, Token::Ip6 | Token::Ipv6)
    }

    /// Borrowed text of a [`Token::Word`].
    pub const fn word(&self) -> Option<&'a str> {
        match *self {
            Token::Word(text) => Some(text),
            _ => None,
        }
    }

    /// Source text of the token, for diagnostics.
    pub const fn text(&self) -> &'a str {
        match *self {
            Token::Allow => "allow",
            Token::Drop => "drop",
            Token::Deny => "deny",
            Token::Src => "src",
            Token::Dst => "dst",
            Token::Host => "host",
            Token::Net => "net",
            Token::Port => "port",
            Token::Ip => "ip",
            Token::Proto => "proto",
            Token::Ip6 => "ip6",
            Token::Tcp => "tcp",
            Token::Udp => "udp",
            Token::Mask => "mask",
            Token::Flow => "flow",
            Token::Create => "create",
            Token::Group => "group",
            Token::Ingress => "ingress",
            Token::Egress => "egress",
            Token::Transfer => "transfer",
            Token::Pattern => "pattern",
            Token::Actions => "actions",
            Token::End => "end",
            Token::Slash => "/",
            Token::Eth => "eth",
            Token::Ipv4 => "ipv4",
            Token::Ipv6 => "ipv6",
            Token::Is => "is",
            Token::Spec => "spec",
            Token::Word(text) => text,
        }
    }
}

/// Splits a line into tokens. Input the lexer cannot classify becomes a
/// [`Token::Word`] so callers see every non-separator character.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    Token::lexer(line)
        .spanned()
        .map(|(token, span)| token.unwrap_or(Token::Word(&line[span])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_line() {
        let tokens = tokenize("allow src host 10.0.0.5 && tcp dst port 80,");
        assert_eq!(
            tokens,
            vec![
                Token::Allow,
                Token::Src,
                Token::Host,
                Token::Word("10.0.0.5"),
                Token::Word("&&"),
                Token::Tcp,
                Token::Dst,
                Token::Port,
                Token::Word("80"),
            ]
        );
    }

    #[test]
    fn test_prefix_stays_one_word() {
        let tokens = tokenize("10.1.2.0/24 7");
        assert_eq!(tokens, vec![Token::Word("10.1.2.0/24"), Token::Word("7")]);
    }

    #[test]
    fn test_keyword_prefix_is_a_word() {
        // longest match wins over the keyword
        assert_eq!(tokenize("allowed"), vec![Token::Word("allowed")]);
        assert_eq!(tokenize("ipv4"), vec![Token::Ipv4]);
    }

    #[test]
    fn test_director_line() {
        let tokens = tokenize("flow create 0 ingress pattern eth / ipv4 src is 1.2.3.4 / end");
        assert_eq!(tokens[0], Token::Flow);
        assert_eq!(tokens[1], Token::Create);
        assert_eq!(tokens[2].word(), Some("0"));
        assert!(tokens.contains(&Token::Slash));
        assert_eq!(tokens.last(), Some(&Token::End));
    }

    #[test]
    fn test_slash_splits_only_when_standalone() {
        assert_eq!(tokenize("/"), vec![Token::Slash]);
        assert_eq!(
            tokenize("eth / ipv4 dst is 10.0.0.0/8"),
            vec![
                Token::Eth,
                Token::Slash,
                Token::Ipv4,
                Token::Dst,
                Token::Is,
                Token::Word("10.0.0.0/8"),
            ]
        );
    }

    #[test]
    fn test_ipv6_marker() {
        assert!(tokenize("allow ip6 src host ::1").iter().any(Token::is_ipv6_marker));
        assert!(!tokenize("allow ip proto 6").iter().any(Token::is_ipv6_marker));
    }
}
