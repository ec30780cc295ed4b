//! DNS check verdict

use std::fmt;

use crate::domain::whitelist::is_ipv4;

/// Whether a domain's A records point at this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsVerdict {
    Match,
    /// The query returned no A records
    NoRecords,
    /// A records exist but none is the host address
    Mismatch { records: Vec<String> },
}

impl DnsVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Match)
    }
}

impl fmt::Display for DnsVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "DNS points at this server"),
            Self::NoRecords => write!(f, "No A records found for the domain"),
            Self::Mismatch { records } => write!(
                f,
                "DNS points at {} instead of this server",
                records.join(", ")
            ),
        }
    }
}

/// A records from `dig +short` output: dotted-quad lines only, so CNAME hops are ignored
pub fn a_records(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| is_ipv4(line))
        .map(str::to_string)
        .collect()
}

/// First address of `hostname -I` output
pub fn primary_address(output: &str) -> String {
    output.split_whitespace().next().unwrap_or("").to_string()
}

/// Compare the host address with the domain's A records
pub fn verdict(host: &str, records: &[String]) -> DnsVerdict {
    if records.is_empty() {
        DnsVerdict::NoRecords
    } else if !host.is_empty() && records.iter().any(|r| r == host) {
        DnsVerdict::Match
    } else {
        DnsVerdict::Mismatch {
            records: records.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn host_among_records_matches() {
        let v = verdict("1.2.3.4", &strings(&["1.2.3.4", "5.6.7.8"]));
        assert_eq!(v, DnsVerdict::Match);
        assert!(v.is_valid());
    }

    #[test]
    fn host_missing_reports_mismatch() {
        let v = verdict("1.2.3.4", &strings(&["5.6.7.8"]));
        assert_eq!(
            v,
            DnsVerdict::Mismatch {
                records: strings(&["5.6.7.8"])
            }
        );
        assert!(v.to_string().contains("5.6.7.8"));
    }

    #[test]
    fn empty_answer_is_distinct() {
        assert_eq!(verdict("1.2.3.4", &[]), DnsVerdict::NoRecords);
    }

    #[test]
    fn unknown_host_never_matches() {
        assert!(!verdict("", &strings(&["5.6.7.8"])).is_valid());
    }

    #[test]
    fn cname_lines_are_skipped() {
        let answer = "bot.example.net.\n1.2.3.4\n\n5.6.7.8\n";
        assert_eq!(a_records(answer), strings(&["1.2.3.4", "5.6.7.8"]));
    }

    #[test]
    fn primary_address_takes_first_token() {
        assert_eq!(primary_address("10.0.0.5 172.17.0.1 fe80::1\n"), "10.0.0.5");
        assert_eq!(primary_address("   "), "");
    }
}
