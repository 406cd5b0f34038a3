/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Interpret a FIX tag 54 value.
    ///
    /// Only `"1"` means buy; every other value is a sell.
    pub fn from_fix(value: &str) -> Self {
        if value == "1" { Side::Buy } else { Side::Sell }
    }

    /// FIX tag 54 code
    pub fn fix_code(&self) -> &'static str {
        match self {
            Side::Buy => "1",
            Side::Sell => "2",
        }
    }

    /// Upper-case name used in acknowledgments
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Parse a human-entered side (`BUY`, `buy`, `SELL`, ...)
    pub fn parse_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("buy") {
            Some(Side::Buy)
        } else if name.eq_ignore_ascii_case("sell") {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fix() {
        assert_eq!(Side::from_fix("1"), Side::Buy);
        assert_eq!(Side::from_fix("2"), Side::Sell);
        assert_eq!(Side::from_fix(""), Side::Sell);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(Side::parse_name("buy"), Some(Side::Buy));
        assert_eq!(Side::parse_name("SELL"), Some(Side::Sell));
        assert_eq!(Side::parse_name("hold"), None);
    }
}
