use std::fmt;

/// A syntactically valid email address with an optional display name.
///
/// Accepts either a bare `local@domain` address or the `Name <local@domain>`
/// form. Validation is deliberately shallow: exactly one `@`, a non-empty
/// local part and domain, and no whitespace or angle brackets inside the
/// address itself. Deliverability is the provider's problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    name: Option<String>,
    address: String,
}

impl EmailAddress {
    /// Parse and validate an address.
    ///
    /// The error is a static reason string; callers attach the field name.
    ///
    /// # Examples
    ///
    /// ```
    /// use inkwell_core::EmailAddress;
    ///
    /// let addr = EmailAddress::parse("Ada <ada@example.com>").unwrap();
    /// assert_eq!(addr.address(), "ada@example.com");
    /// assert_eq!(addr.name(), Some("Ada"));
    /// assert!(EmailAddress::parse("ada@").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, &'static str> {
        let input = input.trim();
        if input.is_empty() {
            return Err("address is empty");
        }

        let (name, address) = match (input.find('<'), input.ends_with('>')) {
            (Some(open), true) => {
                let name = input[..open].trim().trim_matches('"').trim();
                let address = &input[open + 1..input.len() - 1];
                let name = (!name.is_empty()).then(|| name.to_owned());
                (name, address.trim())
            }
            (None, false) => (None, input),
            _ => return Err("unbalanced angle brackets"),
        };

        validate_addr_spec(address)?;

        Ok(Self {
            name,
            address: address.to_owned(),
        })
    }

    /// The bare `local@domain` part.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The display name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The domain part of the address.
    pub fn domain(&self) -> &str {
        // Validation guarantees exactly one '@'.
        self.address
            .split_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

fn validate_addr_spec(address: &str) -> Result<(), &'static str> {
    if address.chars().any(char::is_whitespace) {
        return Err("address contains whitespace");
    }
    if address.contains(['<', '>']) {
        return Err("address contains angle brackets");
    }

    let mut parts = address.split('@');
    let local = parts.next().unwrap_or_default();
    let Some(domain) = parts.next() else {
        return Err("missing '@'");
    };
    if parts.next().is_some() {
        return Err("more than one '@'");
    }
    if local.is_empty() {
        return Err("empty local part");
    }
    if domain.is_empty() {
        return Err("empty domain");
    }
    Ok(())
}
