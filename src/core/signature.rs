use std::str::FromStr;

use crate::core::error::SignatureError;

/// A single declared input of a task's work function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// Optional parameters may be left unbound; they then produce no edge.
    pub required: bool,
}

/// The statically declared input schema of a task.
///
/// Parameters are positional-or-keyword and bound in declaration order. An
/// optional keyword capture absorbs keyword arguments that match no declared
/// parameter.
///
/// The text form lists names separated by commas. A trailing `?` marks a
/// parameter optional and a leading `**` declares the capture:
///
/// ```rust
/// use taskwright::Signature;
///
/// let sig: Signature = "x, y, c?, **extra".parse().unwrap();
/// assert_eq!(sig.names(), vec!["x", "y", "c", "extra"]);
/// ```
///
/// The builder methods do not check what they are given. A signature built
/// with a duplicate name or a required parameter after an optional one is
/// rejected by [`Signature::validate`] when the task is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub var_keyword: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Appends an optional parameter.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Declares the keyword capture.
    pub fn var_keyword(mut self, name: impl Into<String>) -> Self {
        self.var_keyword = Some(name.into());
        self
    }

    /// All declared names in order, the capture last.
    pub fn names(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| p.name.clone())
            .chain(self.var_keyword.iter().cloned())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.var_keyword.is_none()
    }

    /// Checks the rules the text form enforces: identifier names, no name
    /// declared twice (the capture included) and no required parameter after
    /// an optional one.
    pub fn validate(&self) -> Result<(), SignatureError> {
        let mut seen_optional = false;
        for (index, param) in self.params.iter().enumerate() {
            if !valid_identifier(&param.name) {
                return Err(SignatureError::InvalidName(param.name.clone()));
            }
            if self.params[..index].iter().any(|p| p.name == param.name) {
                return Err(SignatureError::Duplicate(param.name.clone()));
            }
            if param.required && seen_optional {
                return Err(SignatureError::RequiredAfterOptional(param.name.clone()));
            }
            seen_optional |= !param.required;
        }

        if let Some(capture) = &self.var_keyword {
            if !valid_identifier(capture) {
                return Err(SignatureError::InvalidName(capture.clone()));
            }
            if self.position(capture).is_some() {
                return Err(SignatureError::Duplicate(capture.clone()));
            }
        }
        Ok(())
    }
}

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sig = Signature::new();
        if s.trim().is_empty() {
            return Ok(sig);
        }

        for (index, raw) in s.split(',').enumerate() {
            let token = raw.trim();
            if token.is_empty() {
                return Err(SignatureError::EmptyName(index));
            }

            let (name, capture, optional) = if let Some(rest) = token.strip_prefix("**") {
                (rest.trim(), true, false)
            } else if let Some(rest) = token.strip_suffix('?') {
                (rest.trim(), false, true)
            } else {
                (token, false, false)
            };

            if !valid_identifier(name) {
                return Err(SignatureError::InvalidName(token.to_string()));
            }
            if sig.var_keyword.is_some() {
                return Err(SignatureError::AfterCapture(name.to_string()));
            }
            if sig.position(name).is_some() {
                return Err(SignatureError::Duplicate(name.to_string()));
            }

            if capture {
                sig.var_keyword = Some(name.to_string());
            } else if optional {
                sig = sig.optional(name);
            } else {
                if sig.params.iter().any(|p| !p.required) {
                    return Err(SignatureError::RequiredAfterOptional(name.to_string()));
                }
                sig = sig.param(name);
            }
        }

        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_optional() {
        let sig: Signature = "x, y, c?".parse().unwrap();
        assert_eq!(sig.names(), vec!["x", "y", "c"]);
        assert!(sig.params[0].required);
        assert!(sig.params[1].required);
        assert!(!sig.params[2].required);
        assert!(sig.var_keyword.is_none());
    }

    #[test]
    fn test_parse_capture() {
        let sig: Signature = "a, **rest".parse().unwrap();
        assert_eq!(sig.var_keyword.as_deref(), Some("rest"));
        assert_eq!(sig.names(), vec!["a", "rest"]);
    }

    #[test]
    fn test_parse_empty() {
        let sig: Signature = "  ".parse().unwrap();
        assert!(sig.is_empty());
        assert!(sig.names().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "a, a".parse::<Signature>(),
            Err(SignatureError::Duplicate("a".into()))
        );
        assert_eq!(
            "a?, b".parse::<Signature>(),
            Err(SignatureError::RequiredAfterOptional("b".into()))
        );
        assert_eq!(
            "**kw, b".parse::<Signature>(),
            Err(SignatureError::AfterCapture("b".into()))
        );
        assert_eq!("a,,b".parse::<Signature>(), Err(SignatureError::EmptyName(1)));
        assert!(matches!(
            "1abc".parse::<Signature>(),
            Err(SignatureError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_builder_output() {
        assert_eq!(Signature::new().param("x").optional("c").validate(), Ok(()));
        assert_eq!(
            Signature::new().param("x").param("x").validate(),
            Err(SignatureError::Duplicate("x".into()))
        );
        assert_eq!(
            Signature::new().optional("c").param("x").validate(),
            Err(SignatureError::RequiredAfterOptional("x".into()))
        );
        assert_eq!(
            Signature::new().param("x").var_keyword("x").validate(),
            Err(SignatureError::Duplicate("x".into()))
        );
        assert_eq!(
            Signature::new().param("").validate(),
            Err(SignatureError::InvalidName("".into()))
        );
    }

    #[test]
    fn test_builder_matches_parse() {
        let built = Signature::new().param("x").param("y").optional("c");
        let parsed: Signature = "x, y, c?".parse().unwrap();
        assert_eq!(built, parsed);
    }
}
