use crate::error::HarvestError;

/// Fixed, ordered ring of credentials. `advance()` moves to the next slot,
/// wrapping modulo the slot count; slots are never removed.
#[derive(Clone, Debug)]
pub struct CredentialRotator {
    slots: Vec<String>,
    index: usize,
}

impl CredentialRotator {
    pub fn new<I, S>(credentials: I) -> Result<Self, HarvestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots: Vec<String> = credentials.into_iter().map(Into::into).collect();
        if slots.is_empty() {
            return Err(HarvestError::Configuration("at least one credential is required".into()));
        }
        Ok(Self { slots, index: 0 })
    }

    #[inline] pub fn current(&self) -> &str { &self.slots[self.index] }
    #[inline] pub fn index(&self) -> usize { self.index }
    #[inline] pub fn len(&self) -> usize { self.slots.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn advance(&mut self) -> &str {
        self.index = (self.index + 1) % self.slots.len();
        &self.slots[self.index]
    }

    /// Current credential with the middle elided, for logs.
    pub fn masked_current(&self) -> String {
        mask(self.current())
    }
}

pub(crate) fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}
