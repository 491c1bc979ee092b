//! Route table: path prefix to backend target

use crate::gateway::GatewayError;

/// One forwarding rule
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Path prefix to match, always starting with `/`
    pub prefix: String,
    /// Backend base URL, no trailing slash
    pub target: String,
}

impl RouteRule {
    /// Parse a `prefix=target` rule string
    pub fn parse(rule: &str) -> Result<Self, GatewayError> {
        let (prefix, target) = rule
            .split_once('=')
            .ok_or_else(|| GatewayError::Route(format!("expected prefix=target, got '{}'", rule)))?;

        let prefix = prefix.trim();
        let target = target.trim().trim_end_matches('/');

        if !prefix.starts_with('/') {
            return Err(GatewayError::Route(format!(
                "prefix must start with '/', got '{}'",
                prefix
            )));
        }
        if !target.starts_with("http://") && !target.starts_with("https://") {
            return Err(GatewayError::Route(format!(
                "target must be an http(s) URL, got '{}'",
                target
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            target: target.to_string(),
        })
    }
}

/// Prefix-match route table, longest prefix wins
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Build a table from `prefix=target` rule strings
    pub fn parse(rules: &[String]) -> Result<Self, GatewayError> {
        let mut parsed = rules
            .iter()
            .map(|r| RouteRule::parse(r))
            .collect::<Result<Vec<_>, _>>()?;

        // Longest prefix first so the most specific rule wins
        parsed.sort_by_key(|r| std::cmp::Reverse(r.prefix.len()));

        Ok(Self { rules: parsed })
    }

    /// Find the rule for a request path
    pub fn find(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|r| path.starts_with(&r.prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rules: &[&str]) -> RouteTable {
        let rules: Vec<String> = rules.iter().map(|s| s.to_string()).collect();
        RouteTable::parse(&rules).unwrap()
    }

    #[test]
    fn test_parse_rule() {
        let rule = RouteRule::parse("/api/patients=http://localhost:8082/").unwrap();
        assert_eq!(rule.prefix, "/api/patients");
        assert_eq!(rule.target, "http://localhost:8082");
    }

    #[test]
    fn test_parse_rule_invalid() {
        assert!(RouteRule::parse("no-equals").is_err());
        assert!(RouteRule::parse("api=http://x").is_err());
        assert!(RouteRule::parse("/api=ftp://x").is_err());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = table(&[
            "/api=http://general:80",
            "/api/billing=http://billing:80",
        ]);

        assert_eq!(
            table.find("/api/billing/invoices").unwrap().target,
            "http://billing:80"
        );
        assert_eq!(
            table.find("/api/patients/42").unwrap().target,
            "http://general:80"
        );
        assert!(table.find("/metrics").is_none());
    }
}
