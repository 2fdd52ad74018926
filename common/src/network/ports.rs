use crate::error::ParseError;

/// Expands a port-range expression like `"80,443,8000-8010"` into a
/// concrete ordered list.
///
/// Tokens are expanded in listed order and never deduplicated or sorted
/// across tokens; `"80,80"` really does yield the port twice. A reversed
/// range (`"100-50"`) expands to nothing rather than failing. Both
/// behaviors match the reference tool and are covered by tests.
pub fn expand_ports(spec: &str) -> Result<Vec<u16>, ParseError> {
    if spec.trim().is_empty() {
        return Err(ParseError::InvalidPortSpec(
            "empty specification".to_string(),
        ));
    }

    let mut ports = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                ports.extend(start..=end);
            }
            None => ports.push(parse_port(token)?),
        }
    }
    Ok(ports)
}

fn parse_port(token: &str) -> Result<u16, ParseError> {
    token
        .trim()
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidPortSpec(format!("not a port number: {token:?}")))
}
