use std::fmt;

/// Secret used to authenticate against the chat-completions API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input; presence is the only check applied.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// A pre-configured key always wins over one typed into the form.
    pub fn resolve(preconfigured: Option<&Credential>, user_supplied: Option<&str>) -> Option<Self> {
        match preconfigured {
            Some(credential) => Some(credential.clone()),
            None => user_supplied.and_then(Credential::new),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
